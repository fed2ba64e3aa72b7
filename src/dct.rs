//! Orthonormal 8x8 DCT-II and its inverse.
//!
//! Blocks are 64 values in row-major order, index = row * 8 + col. No level
//! shift is applied; only AC coefficients are ever compared.

use std::f64::consts::PI;
use std::sync::OnceLock;

pub const BLOCK: usize = 8;

/// `COSINE[u][x] = cos((2x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
            }
        }
        table
    })
}

/// C(0) = 1/sqrt(8), C(u > 0) = 1/2.
fn norm(u: usize) -> f64 {
    if u == 0 {
        1.0 / 8f64.sqrt()
    } else {
        0.5
    }
}

pub fn forward(pixels: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();

    // rows
    let mut temp = [0.0f64; 64];
    for row in 0..BLOCK {
        for u in 0..BLOCK {
            let sum: f64 = (0..BLOCK).map(|x| pixels[row * 8 + x] * cos[u][x]).sum();
            temp[row * 8 + u] = norm(u) * sum;
        }
    }

    // columns
    let mut coeffs = [0.0f64; 64];
    for col in 0..BLOCK {
        for v in 0..BLOCK {
            let sum: f64 = (0..BLOCK).map(|y| temp[y * 8 + col] * cos[v][y]).sum();
            coeffs[v * 8 + col] = norm(v) * sum;
        }
    }

    coeffs
}

pub fn inverse(coeffs: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();

    // columns
    let mut temp = [0.0f64; 64];
    for col in 0..BLOCK {
        for y in 0..BLOCK {
            temp[y * 8 + col] = (0..BLOCK)
                .map(|v| norm(v) * coeffs[v * 8 + col] * cos[v][y])
                .sum();
        }
    }

    // rows
    let mut pixels = [0.0f64; 64];
    for row in 0..BLOCK {
        for x in 0..BLOCK {
            pixels[row * 8 + x] = (0..BLOCK)
                .map(|u| norm(u) * temp[row * 8 + u] * cos[u][x])
                .sum();
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> [f64; 64] {
        let mut block = [0.0f64; 64];
        for (i, value) in block.iter_mut().enumerate() {
            *value = ((i * 37) % 200) as f64 + 20.0;
        }
        block
    }

    #[test]
    fn test_inverse_undoes_forward() {
        let pixels = ramp();
        let back = inverse(&forward(&pixels));
        for (a, b) in pixels.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_flat_block_has_only_dc() {
        let coeffs = forward(&[100.0; 64]);
        assert!((coeffs[0] - 800.0).abs() < 1e-9);
        assert!(coeffs[1..].iter().all(|c| c.abs() < 1e-9));
    }

    #[test]
    fn test_energy_preserved() {
        let pixels = ramp();
        let coeffs = forward(&pixels);
        let e_pixels: f64 = pixels.iter().map(|p| p * p).sum();
        let e_coeffs: f64 = coeffs.iter().map(|c| c * c).sum();
        assert!((e_pixels - e_coeffs).abs() / e_pixels < 1e-12);
    }
}
