// E-paper display seam and the file-backed preview backend
use crate::presentation::plane::Plane;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display transfer failed: {0}")]
    Transfer(String),
    #[error("plane size {found:?} does not match panel {expected:?}")]
    Geometry { expected: (u32, u32), found: (u32, u32) },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A two-plane e-paper panel. Implementations own the low-level transfer.
pub trait EpaperDisplay: Send {
    /// Wake the controller ahead of a transfer
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Push the black and highlight planes as one frame
    fn display(&mut self, black: &Plane, highlight: &Plane) -> Result<(), DisplayError>;

    /// Enter low-power mode until the next `init`
    fn sleep(&mut self) -> Result<(), DisplayError>;
}

/// Writes each frame into a directory instead of driving hardware.
///
/// `latest.png` is the composited view; `black.bin` and `highlight.bin` hold the
/// packed driver buffers exactly as a panel transfer would receive them.
#[derive(Debug)]
pub struct PreviewDisplay {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    awake: bool,
}

impl PreviewDisplay {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Result<Self, DisplayError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            width,
            height,
            awake: false,
        })
    }

    fn check_geometry(&self, plane: &Plane) -> Result<(), DisplayError> {
        let found = (plane.width(), plane.height());
        if found != (self.width, self.height) {
            return Err(DisplayError::Geometry {
                expected: (self.width, self.height),
                found,
            });
        }
        Ok(())
    }
}

impl EpaperDisplay for PreviewDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.awake = true;
        Ok(())
    }

    fn display(&mut self, black: &Plane, highlight: &Plane) -> Result<(), DisplayError> {
        if !self.awake {
            return Err(DisplayError::Transfer("display is asleep".to_string()));
        }
        self.check_geometry(black)?;
        self.check_geometry(highlight)?;

        fs::write(self.output_dir.join("black.bin"), black.to_driver_buffer())?;
        fs::write(self.output_dir.join("highlight.bin"), highlight.to_driver_buffer())?;
        composite(black, highlight).save(self.output_dir.join("latest.png"))?;

        tracing::debug!("Wrote preview frame to {}", self.output_dir.display());
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.awake = false;
        Ok(())
    }
}

/// Black ink wins over highlight ink where both are set.
fn composite(black: &Plane, highlight: &Plane) -> RgbImage {
    RgbImage::from_fn(black.width(), black.height(), |x, y| {
        if black.is_ink(x, y) {
            Rgb([0, 0, 0])
        } else if highlight.is_ink(x, y) {
            Rgb([200, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Background art for both planes, re-read every cycle so each frame starts clean.
#[derive(Debug, Clone)]
pub struct BackgroundArt {
    black: PathBuf,
    highlight: PathBuf,
    width: u32,
    height: u32,
}

impl BackgroundArt {
    pub fn new(
        black: impl Into<PathBuf>,
        highlight: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            black: black.into(),
            highlight: highlight.into(),
            width,
            height,
        }
    }

    /// Load both images, failing if either is missing or the wrong size.
    pub fn load(&self) -> Result<(Plane, Plane), DisplayError> {
        Ok((self.load_plane(&self.black)?, self.load_plane(&self.highlight)?))
    }

    /// Like [`BackgroundArt::load`], falling back to blank planes.
    pub fn load_or_blank(&self) -> (Plane, Plane) {
        let load = |path: &Path| {
            self.load_plane(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Background {} unavailable, using blank plane: {}",
                    path.display(),
                    e
                );
                Plane::new(self.width, self.height)
            })
        };
        (load(&self.black), load(&self.highlight))
    }

    fn load_plane(&self, path: &Path) -> Result<Plane, DisplayError> {
        let plane = Plane::from_luma(&image::open(path)?.to_luma8());
        let found = (plane.width(), plane.height());
        if found != (self.width, self.height) {
            return Err(DisplayError::Geometry {
                expected: (self.width, self.height),
                found,
            });
        }
        Ok(plane)
    }
}
