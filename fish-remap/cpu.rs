use fish_core::{FishResult, Image, RemapParams};
use rayon::prelude::*;

use crate::backend::RemapBackend;
use crate::geometry::{source_coords, BACKGROUND};
use crate::sampling::bilinear_sample;

/// Reference backend: rows of the destination grid run in parallel on rayon
#[derive(Debug, Clone, Default)]
pub struct CpuRemapper;

impl CpuRemapper {
    pub fn new() -> Self {
        Self
    }
}

impl RemapBackend for CpuRemapper {
    fn name(&self) -> &str {
        "cpu"
    }

    fn project(&self, source: &Image, params: &RemapParams) -> FishResult<Image> {
        let (w, h) = source.dimensions();
        let dims = (w, h);
        let mut out = Image::new(w, h);
        let row_len = w as usize * 4;

        out.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(v, row)| {
                for (u, px) in row.chunks_exact_mut(4).enumerate() {
                    let value = match source_coords(u as u32, v as u32, dims, dims, params) {
                        Some((sx, sy)) => bilinear_sample(source, sx, sy),
                        None => BACKGROUND,
                    };
                    px.copy_from_slice(&value);
                }
            });

        Ok(out)
    }
}
