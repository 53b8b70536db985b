/// Density-independent length. Converted to pixels through the layout
/// context's density.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Dp(pub f32);

impl Dp {
    pub fn to_px(self, density: f32) -> f32 {
        self.0 * density
    }
}
