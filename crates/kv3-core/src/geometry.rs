//! Geometry value types stored as fixed-length numeric arrays.

/// RGBA color with 8-bit channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// The channels in `r, g, b, a` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

/// 3-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    /// X.
    pub x: f32,
    /// Y.
    pub y: f32,
    /// Z.
    pub z: f32,
}

/// 2-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2D {
    /// X.
    pub x: f32,
    /// Y.
    pub y: f32,
}

/// 4-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector4D {
    /// X.
    pub x: f32,
    /// Y.
    pub y: f32,
    /// Z.
    pub z: f32,
    /// W.
    pub w: f32,
}

/// Rotation quaternion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quaternion {
    /// X.
    pub x: f32,
    /// Y.
    pub y: f32,
    /// Z.
    pub z: f32,
    /// W.
    pub w: f32,
}

/// Euler angles in degrees (pitch, yaw, roll).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QAngle {
    /// Pitch.
    pub x: f32,
    /// Yaw.
    pub y: f32,
    /// Roll.
    pub z: f32,
}

/// Row-major 3x4 affine matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Matrix3x4 {
    /// Rows.
    pub m: [[f32; 4]; 3],
}

/// A geometry type that is stored as a fixed number of `f32` components.
pub trait FloatComponents: Copy {
    /// Number of components.
    const LEN: usize;

    /// Write the components into `out` (`out.len() == LEN`).
    fn write_components(&self, out: &mut [f32]);

    /// Build from exactly `LEN` components.
    fn from_components(c: &[f32]) -> Self;
}

impl FloatComponents for Vector {
    const LEN: usize = 3;

    fn write_components(&self, out: &mut [f32]) {
        out.copy_from_slice(&[self.x, self.y, self.z]);
    }

    fn from_components(c: &[f32]) -> Self {
        Self { x: c[0], y: c[1], z: c[2] }
    }
}

impl FloatComponents for Vector2D {
    const LEN: usize = 2;

    fn write_components(&self, out: &mut [f32]) {
        out.copy_from_slice(&[self.x, self.y]);
    }

    fn from_components(c: &[f32]) -> Self {
        Self { x: c[0], y: c[1] }
    }
}

impl FloatComponents for Vector4D {
    const LEN: usize = 4;

    fn write_components(&self, out: &mut [f32]) {
        out.copy_from_slice(&[self.x, self.y, self.z, self.w]);
    }

    fn from_components(c: &[f32]) -> Self {
        Self { x: c[0], y: c[1], z: c[2], w: c[3] }
    }
}

impl FloatComponents for Quaternion {
    const LEN: usize = 4;

    fn write_components(&self, out: &mut [f32]) {
        out.copy_from_slice(&[self.x, self.y, self.z, self.w]);
    }

    fn from_components(c: &[f32]) -> Self {
        Self { x: c[0], y: c[1], z: c[2], w: c[3] }
    }
}

impl FloatComponents for QAngle {
    const LEN: usize = 3;

    fn write_components(&self, out: &mut [f32]) {
        out.copy_from_slice(&[self.x, self.y, self.z]);
    }

    fn from_components(c: &[f32]) -> Self {
        Self { x: c[0], y: c[1], z: c[2] }
    }
}

impl FloatComponents for Matrix3x4 {
    const LEN: usize = 12;

    fn write_components(&self, out: &mut [f32]) {
        for (row, chunk) in self.m.iter().zip(out.chunks_exact_mut(4)) {
            chunk.copy_from_slice(row);
        }
    }

    fn from_components(c: &[f32]) -> Self {
        let mut m = [[0.0; 4]; 3];
        for (row, chunk) in m.iter_mut().zip(c.chunks_exact(4)) {
            row.copy_from_slice(chunk);
        }
        Self { m }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_is_opaque_black() {
        assert_eq!(Color::default().to_array(), [0, 0, 0, 255]);
    }

    #[test]
    fn matrix_components_are_row_major() {
        let mut m = Matrix3x4::default();
        m.m[1][2] = 5.0;
        let mut out = [0.0f32; 12];
        m.write_components(&mut out);
        assert_eq!(out[6], 5.0);
        assert_eq!(Matrix3x4::from_components(&out), m);
    }

    #[test]
    fn vector_components() {
        let v = Vector { x: 1.0, y: 2.0, z: 3.0 };
        let mut out = [0.0f32; 3];
        v.write_components(&mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }
}
