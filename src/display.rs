use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use image::{DynamicImage, ImageFormat};

pub trait Display {
    fn show(&mut self, image: &DynamicImage) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("cannot encode PNG")?;
    Ok(buffer.into_inner())
}

pub struct PngDirectory {
    dir: PathBuf,
    shown: usize,
    written: Vec<PathBuf>,
}

impl PngDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        Ok(Self {
            dir,
            shown: 0,
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Display for PngDirectory {
    fn show(&mut self, image: &DynamicImage) -> Result<()> {
        self.shown += 1;
        let name = format!(
            "snapshot {} {:03}.png",
            Local::now().format("%Y-%m-%d at %H.%M.%S"),
            self.shown
        );
        let path = self.dir.join(name);
        let png = encode_png(image)?;
        std::fs::write(&path, png).with_context(|| format!("cannot save png to {}", path.display()))?;
        log::debug!(target: "display", "saved {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
