/// Clip a float channel value to `[0, 255]` and truncate toward zero.
pub(crate) fn quantize_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clips_and_truncates() {
        assert_eq!(quantize_u8(-3.0), 0);
        assert_eq!(quantize_u8(12.9), 12);
        assert_eq!(quantize_u8(300.0), 255);
        assert_eq!(quantize_u8(f32::NAN), 0);
    }
}
