//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Sizes are `(width, height)` tuples; results are never smaller than 1x1.

/// Calculate dimensions that fit inside a target box, preserving aspect ratio.
///
/// One dimension matches the target exactly, the other is equal or smaller.
///
/// # Examples
/// ```
/// # use mediamill::imaging::calculate_fit_dimensions;
/// // 300x100 (3:1) into 100x50 → width limits: 100x33
/// assert_eq!(calculate_fit_dimensions((300, 100), (100, 50)), (100, 33));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: width is the limiting dimension
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.clamp(1, tgt_h))
    } else {
        // Source is taller (or same shape): height is the limiting dimension
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.clamp(1, tgt_w), tgt_h)
    }
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), tgt_h)
    } else {
        // Source is taller: width will match, height will exceed
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.max(tgt_h))
    }
}

/// Top-left corner of a `target`-sized crop window inside `scaled`.
///
/// `offset` places the window within the slack: `(0, 0)` is top-left,
/// `(1, 1)` is bottom-right. The window always lies inside `scaled`.
pub fn calculate_crop_origin(scaled: (u32, u32), target: (u32, u32), offset: (f64, f64)) -> (u32, u32) {
    let slack_x = scaled.0.saturating_sub(target.0);
    let slack_y = scaled.1.saturating_sub(target.1);
    let left = (slack_x as f64 * offset.0).round() as u32;
    let top = (slack_y as f64 * offset.1).round() as u32;
    (left.min(slack_x), top.min(slack_y))
}

/// Where to paste a `scaled` image on a `canvas`-sized background.
///
/// Truncates toward zero, so a centred odd slack leaves the extra pixel on the
/// right/bottom edge.
pub fn calculate_paste_position(canvas: (u32, u32), scaled: (u32, u32), offset: (f64, f64)) -> (u32, u32) {
    let slack_x = canvas.0.saturating_sub(scaled.0);
    let slack_y = canvas.1.saturating_sub(scaled.1);
    let x = (slack_x as f64 * offset.0) as u32;
    let y = (slack_y as f64 * offset.1) as u32;
    (x.min(slack_x), y.min(slack_y))
}
