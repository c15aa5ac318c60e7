//! WAV write/read round trips through the codec contract

use approx::assert_abs_diff_eq;
use sk_core::DataType;
use sk_dsp::Signal;
use sk_file::{
    ContainerFormat, FileError, SampleEncoding, WavCodec, WriteSpec, create_from_file, file_info,
    write_to_file,
};
use tempfile::TempDir;

fn stereo_ramp(data_type: DataType, len: usize) -> Signal {
    let mut signal = Signal::new(data_type, 2, len, 44100).unwrap();
    for n in 0..len {
        let v = (n as f64 / len as f64) * 1.6 - 0.8;
        signal.write_f64(0, n, v);
        signal.write_f64(1, n, -v * 0.5);
    }
    signal
}

#[test]
fn test_int16_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ramp.wav");
    let signal = stereo_ramp(DataType::Int16, 500);

    write_to_file(&signal, &WavCodec, &path, &WriteSpec::default()).unwrap();

    let info = file_info(&WavCodec, &path).unwrap();
    assert_eq!(info.channel_count, 2);
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.sample_count, 500);
    assert_eq!(info.format, ContainerFormat::Wav);
    assert_eq!(info.encoding, SampleEncoding::Int16);

    let loaded = create_from_file(&WavCodec, &path, DataType::Int16).unwrap();
    assert_eq!(loaded.spec(), signal.spec());
    for c in 0..2 {
        for n in 0..500 {
            assert_eq!(loaded.read::<i16>(c, n), signal.read::<i16>(c, n));
        }
    }
}

#[test]
fn test_float_source_read_as_double() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("float.wav");
    let signal = stereo_ramp(DataType::Float, 64);

    write_to_file(&signal, &WavCodec, &path, &WriteSpec::default()).unwrap();
    assert_eq!(
        file_info(&WavCodec, &path).unwrap().encoding,
        SampleEncoding::Float
    );

    let loaded = create_from_file(&WavCodec, &path, DataType::Double).unwrap();
    assert_eq!(loaded.data_type(), DataType::Double);
    for n in 0..64 {
        assert_abs_diff_eq!(loaded.read_f64(0, n), signal.read_f64(0, n), epsilon = 1e-7);
    }
}

#[test]
fn test_int24_encoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("int24.wav");
    let signal = stereo_ramp(DataType::Double, 100);
    let spec = WriteSpec {
        encoding: SampleEncoding::Int24,
        ..WriteSpec::default()
    };

    write_to_file(&signal, &WavCodec, &path, &spec).unwrap();
    let loaded = create_from_file(&WavCodec, &path, DataType::Float).unwrap();
    for c in 0..2 {
        for n in 0..100 {
            assert_abs_diff_eq!(
                loaded.read_f64(c, n),
                signal.read_f64(c, n),
                epsilon = 1.0 / 8_388_608.0
            );
        }
    }
}

#[test]
fn test_partial_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("span.wav");
    let signal = stereo_ramp(DataType::Int16, 100);
    let spec = WriteSpec {
        offset: 10,
        length: Some(20),
        ..WriteSpec::default()
    };

    write_to_file(&signal, &WavCodec, &path, &spec).unwrap();
    let loaded = create_from_file(&WavCodec, &path, DataType::Int16).unwrap();
    assert_eq!(loaded.sample_count(), 20);
    assert_eq!(loaded.read::<i16>(0, 0), signal.read::<i16>(0, 10));
    assert_eq!(loaded.read::<i16>(1, 19), signal.read::<i16>(1, 29));
}

#[test]
fn test_write_errors() {
    let dir = TempDir::new().unwrap();
    let signal = stereo_ramp(DataType::Float, 10);

    let aiff = WriteSpec {
        container: ContainerFormat::Aiff,
        ..WriteSpec::default()
    };
    assert!(matches!(
        write_to_file(&signal, &WavCodec, dir.path().join("a.aiff"), &aiff),
        Err(FileError::UnsupportedFormat(_))
    ));

    let ulaw = WriteSpec {
        encoding: SampleEncoding::Ulaw,
        ..WriteSpec::default()
    };
    assert!(matches!(
        write_to_file(&signal, &WavCodec, dir.path().join("u.wav"), &ulaw),
        Err(FileError::UnsupportedEncoding(_))
    ));

    let too_long = WriteSpec {
        offset: 5,
        length: Some(10),
        ..WriteSpec::default()
    };
    assert!(matches!(
        write_to_file(&signal, &WavCodec, dir.path().join("r.wav"), &too_long),
        Err(FileError::Engine(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = create_from_file(&WavCodec, dir.path().join("nope.wav"), DataType::Float);
    assert!(matches!(result, Err(FileError::NotFound(_))));
}
