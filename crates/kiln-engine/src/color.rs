//! Packed 8-bit RGBA color.

/// Straight-alpha sRGB color packed as `0xRRGGBBAA`.
///
/// The packed form is what callers store and compare; [`Color::normalized`] produces the
/// `[0, 1]` floats handed to the driver (clear color, uniforms).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    rgba: u32,
}

impl Color {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            rgba: (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32,
        }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Gray level shared by all three channels.
    #[inline]
    pub const fn gray(level: u8, a: u8) -> Self {
        Self::new(level, level, level, a)
    }

    #[inline]
    pub const fn from_rgba(rgba: u32) -> Self {
        Self { rgba }
    }

    /// Builds a color from `[0, 1]` floats. Out-of-range channels are clamped.
    pub fn from_normalized(rgba: [f32; 4]) -> Self {
        let [r, g, b, a] = rgba.map(to_u8);
        Self::new(r, g, b, a)
    }

    pub const fn white() -> Self { Self::rgb(255, 255, 255) }
    pub const fn black() -> Self { Self::rgb(0, 0, 0) }
    pub const fn red() -> Self { Self::rgb(255, 0, 0) }
    pub const fn green() -> Self { Self::rgb(0, 255, 0) }
    pub const fn blue() -> Self { Self::rgb(0, 0, 255) }
    pub const fn transparent() -> Self { Self::new(0, 0, 0, 0) }

    #[inline] pub const fn r(self) -> u8 { (self.rgba >> 24) as u8 }
    #[inline] pub const fn g(self) -> u8 { (self.rgba >> 16) as u8 }
    #[inline] pub const fn b(self) -> u8 { (self.rgba >> 8) as u8 }
    #[inline] pub const fn a(self) -> u8 { self.rgba as u8 }

    #[inline]
    pub const fn rgba(self) -> u32 {
        self.rgba
    }

    pub fn set_r(&mut self, r: u8) -> &mut Self {
        self.rgba = (self.rgba & 0x00FF_FFFF) | (r as u32) << 24;
        self
    }

    pub fn set_g(&mut self, g: u8) -> &mut Self {
        self.rgba = (self.rgba & 0xFF00_FFFF) | (g as u32) << 16;
        self
    }

    pub fn set_b(&mut self, b: u8) -> &mut Self {
        self.rgba = (self.rgba & 0xFFFF_00FF) | (b as u32) << 8;
        self
    }

    pub fn set_a(&mut self, a: u8) -> &mut Self {
        self.rgba = (self.rgba & 0xFFFF_FF00) | a as u32;
        self
    }

    /// Channels as `[r, g, b, a]` in `[0, 1]`.
    #[inline]
    pub fn normalized(self) -> [f32; 4] {
        [self.r(), self.g(), self.b(), self.a()].map(|c| c as f32 / 255.0)
    }

    /// Inverts RGB, keeps alpha.
    pub fn complementary(self) -> Self {
        Self::new(255 - self.r(), 255 - self.g(), 255 - self.b(), self.a())
    }

    /// Scales RGB by `factor`, clamping to the valid range.
    pub fn adjust_brightness(self, factor: f32) -> Self {
        let [r, g, b, a] = self.normalized();
        Self::from_normalized([r * factor, g * factor, b * factor, a])
    }

    /// Rec. 601 luma.
    pub fn to_grayscale(self) -> Self {
        let [r, g, b, _] = self.normalized();
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        Self::gray(to_u8(luma), self.a())
    }

    /// Linear interpolation in normalized space; `t` is clamped to `[0, 1]`.
    pub fn mix(lhs: Self, rhs: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let l = lhs.normalized();
        let r = rhs.normalized();
        Self::from_normalized(std::array::from_fn(|i| l[i] + (r[i] - l[i]) * t))
    }

    /// Straight-alpha "source over destination" compositing.
    pub fn blend(src: Self, dst: Self) -> Self {
        let [sr, sg, sb, sa] = src.normalized();
        let [dr, dg, db, da] = dst.normalized();

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Self::transparent();
        }

        let channel = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
        Self::from_normalized([channel(sr, dr), channel(sg, dg), channel(sb, db), out_a])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl From<u32> for Color {
    fn from(rgba: u32) -> Self {
        Self::from_rgba(rgba)
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_in_rgba_order() {
        let c = Color::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.rgba(), 0x1234_5678);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn setters_touch_one_channel() {
        let mut c = Color::black();
        c.set_g(200).set_a(10);
        assert_eq!(c, Color::new(0, 200, 0, 10));
    }

    #[test]
    fn normalized_round_trips_through_floats() {
        let c = Color::new(255, 128, 0, 64);
        assert_eq!(Color::from_normalized(c.normalized()), c);
        assert_eq!(Color::white().normalized(), [1.0; 4]);
    }

    #[test]
    fn from_normalized_clamps() {
        assert_eq!(Color::from_normalized([2.0, -1.0, 0.0, 1.0]), Color::red());
    }

    #[test]
    fn mix_endpoints() {
        let a = Color::black();
        let b = Color::white();
        assert_eq!(Color::mix(a, b, 0.0), a);
        assert_eq!(Color::mix(a, b, 1.0), b);
        assert_eq!(Color::mix(a, b, 0.5), Color::gray(128, 255));
    }

    #[test]
    fn opaque_source_wins_blend() {
        assert_eq!(Color::blend(Color::red(), Color::blue()), Color::red());
        assert_eq!(Color::blend(Color::transparent(), Color::blue()), Color::blue());
    }

    #[test]
    fn complementary_and_grayscale() {
        assert_eq!(Color::red().complementary(), Color::rgb(0, 255, 255));
        assert_eq!(Color::white().to_grayscale(), Color::white());
    }
}
