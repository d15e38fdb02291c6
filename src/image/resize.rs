/// Target dimensions for a maximum output width.
///
/// A `max_width` of 0 disables resizing. Height is scaled by
/// `max_width / width` and truncated toward zero. Unlike a plain `floor`,
/// a height that would truncate to 0 is clamped to 1 so extreme aspect
/// ratios still produce an encodable image.
pub fn plan(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if max_width == 0 || width <= max_width {
        return (width, height);
    }

    let scale = f64::from(max_width) / f64::from(width);
    let target_height = (scale * f64::from(height)) as u32;

    (max_width, target_height.max(1))
}
