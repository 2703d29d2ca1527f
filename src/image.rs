//! URL construction for the content lake's image CDN.
//!
//! Asset ids look like `image-<hash>-<width>x<height>-<format>`. Requested
//! dimensions become `w`/`h` parameters; when both are given the editor's crop
//! and hotspot are turned into a `rect` so the CDN cuts the right region
//! before scaling.

use crate::config::ContentConfig;
use crate::models::{ImageCrop, ImageHotspot, ImageSource};

pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/550x310/png";

pub const EVENT_IMAGE_WIDTH: u32 = 550;
pub const EVENT_IMAGE_HEIGHT: u32 = 310;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl AssetId {
    pub fn parse(asset_id: &str) -> Option<Self> {
        let mut parts = asset_id.split('-');
        if parts.next()? != "image" {
            return None;
        }
        let id = parts.next()?;
        let (w, h) = parts.next()?.split_once('x')?;
        let format = parts.next()?;
        if parts.next().is_some() || id.is_empty() || format.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            width: w.parse().ok().filter(|w| *w > 0)?,
            height: h.parse().ok().filter(|h| *h > 0)?,
            format: format.to_string(),
        })
    }

    fn filename(&self) -> String {
        format!("{}-{}x{}.{}", self.id, self.width, self.height, self.format)
    }
}

/// Pixel rectangle within the source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    base_url: String,
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// `None` unless the configuration names both a project and a dataset.
    pub fn from_config(config: &ContentConfig) -> Option<Self> {
        if config.project_id.trim().is_empty() || config.dataset.trim().is_empty() {
            return None;
        }
        Some(Self::new(&config.image_cdn, &config.project_id, &config.dataset))
    }

    pub fn url_for(&self, source: &ImageSource, width: u32, height: u32) -> Option<String> {
        let asset = AssetId::parse(source.asset_id()?)?;
        let crop = crop_rect(&asset, &source.crop.unwrap_or_default());
        if crop.is_empty() {
            return None;
        }
        let hotspot = source.hotspot.unwrap_or_default();
        let rect = fit_rect(&asset, crop, &hotspot, width, height);
        if rect.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        let full_frame = rect.left == 0
            && rect.top == 0
            && rect.width == i64::from(asset.width)
            && rect.height == i64::from(asset.height);
        if !full_frame {
            params.push(format!("rect={},{},{},{}", rect.left, rect.top, rect.width, rect.height));
        }
        params.push(format!("w={width}"));
        params.push(format!("h={height}"));

        Some(format!(
            "{}/images/{}/{}/{}?{}",
            self.base_url,
            self.project_id,
            self.dataset,
            asset.filename(),
            params.join("&")
        ))
    }
}

/// Image URL for an event card, or the placeholder when none can be built.
pub fn event_image_url(builder: Option<&ImageUrlBuilder>, image: Option<&ImageSource>) -> String {
    let (Some(builder), Some(image)) = (builder, image) else {
        return PLACEHOLDER_IMAGE_URL.to_string();
    };
    match builder.url_for(image, EVENT_IMAGE_WIDTH, EVENT_IMAGE_HEIGHT) {
        Some(url) => url,
        None => {
            tracing::warn!(asset = ?image.asset_id(), "unusable image asset reference");
            PLACEHOLDER_IMAGE_URL.to_string()
        }
    }
}

fn crop_rect(asset: &AssetId, crop: &ImageCrop) -> Rect {
    let (w, h) = (f64::from(asset.width), f64::from(asset.height));
    let left = (crop.left * w).round() as i64;
    let top = (crop.top * h).round() as i64;
    Rect {
        left,
        top,
        width: (w - crop.right * w - left as f64).round() as i64,
        height: (h - crop.bottom * h - top as f64).round() as i64,
    }
}

/// Largest region of `crop` with the target aspect ratio, centred on the
/// hotspot and kept inside the crop.
fn fit_rect(asset: &AssetId, crop: Rect, hotspot: &ImageHotspot, width: u32, height: u32) -> Rect {
    let (aw, ah) = (f64::from(asset.width), f64::from(asset.height));
    let desired = f64::from(width) / f64::from(height);
    let crop_ratio = crop.width as f64 / crop.height as f64;

    if crop_ratio > desired {
        let h = crop.height;
        let w = (h as f64 * desired).round() as i64;
        let top = crop.top.max(0);
        let center_x = (hotspot.x * aw).round() as i64;
        let mut left = (center_x as f64 - w as f64 / 2.0).round().max(0.0) as i64;
        if left < crop.left {
            left = crop.left;
        } else if left + w > crop.left + crop.width {
            left = crop.left + crop.width - w;
        }
        Rect { left, top, width: w, height: h }
    } else {
        let w = crop.width;
        let h = (w as f64 / desired).round() as i64;
        let left = crop.left.max(0);
        let center_y = (hotspot.y * ah).round() as i64;
        let mut top = (center_y as f64 - h as f64 / 2.0).round().max(0.0) as i64;
        if top < crop.top {
            top = crop.top;
        } else if top + h > crop.top + crop.height {
            top = crop.top + crop.height - h;
        }
        Rect { left, top, width: w, height: h }
    }
}
