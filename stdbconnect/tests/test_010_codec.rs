use log::info;
use stdbconnect::bsatn::{self, Decoder, Encoder};
use stdbconnect::{AlgebraicType, AlgebraicValue, StdbResult};

mod test_utils;

#[test]
fn test_010_codec() -> StdbResult<()> {
    let _log_handle = test_utils::init_logger();
    primitive_frame_byte_layout()?;
    option_byte_layout()?;
    little_endian_property();
    string_length_property();
    boundary_roundtrips();
    Ok(())
}

fn primitive_frame_byte_layout() -> StdbResult<()> {
    info!("u32 then i32 encode to the documented eight bytes");
    let mut encoder = Encoder::new();
    encoder.put_u32(0xDEAD_BEEF);
    encoder.put_i32(-100_000);
    let bytes = encoder.into_bytes();
    assert_eq!(bytes, [0xEF, 0xBE, 0xAD, 0xDE, 0x60, 0x79, 0xFE, 0xFF]);

    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.u32()?, 0xDEAD_BEEF);
    assert_eq!(decoder.i32()?, -100_000);
    assert_eq!(decoder.remaining(), 0);
    Ok(())
}

fn option_byte_layout() -> StdbResult<()> {
    info!("option(u64) layouts");
    let ty = AlgebraicType::Option(Box::new(AlgebraicType::U64));

    let some = AlgebraicValue::Option(Some(Box::new(AlgebraicValue::U64(42))));
    let bytes = bsatn::to_vec(&some)?;
    assert_eq!(bytes, [0x00, 0x2A, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(bsatn::from_slice(&ty, &bytes)?, some);

    let none = AlgebraicValue::Option(None);
    let bytes = bsatn::to_vec(&none)?;
    assert_eq!(bytes, [0x01]);
    assert_eq!(bsatn::from_slice(&ty, &bytes)?, none);
    Ok(())
}

fn little_endian_property() {
    info!("every encoded u32 satisfies the little-endian law");
    for n in [0_u32, 1, 0xFF, 0x1_00, 0xFFFF_FFFF, 0x0102_0304, 0x8000_0000] {
        let mut encoder = Encoder::new();
        encoder.put_u32(n);
        let b = encoder.into_bytes();
        assert_eq!(b.len(), 4);
        assert_eq!(
            u32::from(b[0])
                | u32::from(b[1]) << 8
                | u32::from(b[2]) << 16
                | u32::from(b[3]) << 24,
            n
        );
    }
}

fn string_length_property() {
    info!("string output length is 4 + len, prefix decodes to len");
    for s in ["", "a", "grüße", "SELECT * FROM players"] {
        let mut encoder = Encoder::new();
        encoder.put_str(s).unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(bytes.len(), 4 + s.len());
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.u32().unwrap() as usize, s.len());
    }
}

fn boundary_roundtrips() {
    info!("integer boundaries and empty composites round-trip");
    let cases = [
        (AlgebraicType::U8, AlgebraicValue::U8(0)),
        (AlgebraicType::U8, AlgebraicValue::U8(255)),
        (AlgebraicType::I8, AlgebraicValue::I8(-128)),
        (AlgebraicType::I8, AlgebraicValue::I8(127)),
        (AlgebraicType::U128, AlgebraicValue::U128(u128::MAX)),
        (AlgebraicType::I128, AlgebraicValue::I128(i128::MIN)),
        (
            AlgebraicType::String,
            AlgebraicValue::String(String::new()),
        ),
        (
            AlgebraicType::Array(Box::new(AlgebraicType::U8)),
            AlgebraicValue::Array(vec![]),
        ),
    ];
    for (ty, value) in cases {
        let bytes = bsatn::to_vec(&value).unwrap();
        assert_eq!(bsatn::from_slice(&ty, &bytes).unwrap(), value);
    }

    // the empty composites are four zero bytes
    assert_eq!(
        bsatn::to_vec(&AlgebraicValue::String(String::new())).unwrap(),
        [0, 0, 0, 0]
    );
    assert_eq!(
        bsatn::to_vec(&AlgebraicValue::Array(vec![])).unwrap(),
        [0, 0, 0, 0]
    );
}
