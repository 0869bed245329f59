//! Embedded image extraction from PDF pages.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;

/// Page tree depth after which resource inheritance lookup gives up.
const MAX_TREE_DEPTH: usize = 32;

/// An image extracted from a PDF page, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Page number (1-indexed).
    pub page: u32,
    /// Image number on its page (1-indexed).
    pub index: usize,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// File extension matching `data` (jpg, jp2 or png).
    pub extension: &'static str,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

impl ExtractedImage {
    /// File name for this image: `<stem>_page<N>_img<M>.<ext>`.
    pub fn file_name(&self, stem: &str) -> String {
        format!(
            "{}_page{}_img{}.{}",
            stem, self.page, self.index, self.extension
        )
    }
}

/// Extract the image XObjects referenced by one page.
///
/// JPEG and JPEG 2000 streams are returned verbatim; raw 8-bit RGB and
/// grayscale samples are encoded as PNG. Other encodings are skipped.
pub fn extract_page_images(doc: &Document, page: u32) -> Result<Vec<ExtractedImage>> {
    let pages = doc.get_pages();
    let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

    let Some(resources) = page_resources(doc, page_id) else {
        return Ok(Vec::new());
    };
    let xobjects = match resources.get(b"XObject").and_then(|o| doc.dereference(o)) {
        Ok((_, Object::Dictionary(dict))) => dict,
        _ => return Ok(Vec::new()),
    };

    let mut images = Vec::new();
    for (_name, reference) in xobjects.iter() {
        let Ok((_, object)) = doc.dereference(reference) else {
            continue;
        };
        if let Some(image) = decode_image(doc, object, page, images.len() + 1)? {
            images.push(image);
        }
    }

    debug!("Extracted {} images from page {}", images.len(), page);
    Ok(images)
}

/// Resources of a page, following `Parent` links for inherited resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = doc.dereference(resources) {
                return Some(dict);
            }
        }
        let parent = node.get(b"Parent").and_then(|o| o.as_reference()).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn decode_image(
    doc: &Document,
    object: &Object,
    page: u32,
    index: usize,
) -> Result<Option<ExtractedImage>> {
    let Object::Stream(stream) = object else {
        return Ok(None);
    };
    let dict = &stream.dict;

    let is_image = dict
        .get(b"Subtype")
        .and_then(|o| o.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false);
    if !is_image {
        return Ok(None);
    }

    let (Some(width), Some(height)) = (dict_integer(dict, b"Width"), dict_integer(dict, b"Height"))
    else {
        trace!("Image on page {} has no dimensions", page);
        return Ok(None);
    };
    let (width, height) = (width as u32, height as u32);

    let verbatim = |extension: &'static str| ExtractedImage {
        page,
        index,
        width,
        height,
        extension,
        data: stream.content.clone(),
    };

    match single_filter(dict) {
        Some(b"DCTDecode") => return Ok(Some(verbatim("jpg"))),
        Some(b"JPXDecode") => return Ok(Some(verbatim("jp2"))),
        Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Skipping fax/JBIG2 image on page {}", page);
            return Ok(None);
        }
        _ => {}
    }

    let bits = dict_integer(dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        trace!("Skipping {}-bit image on page {}", bits, page);
        return Ok(None);
    }

    let color_space: &[u8] = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let samples = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let pixels = (width as usize).saturating_mul(height as usize);

    let decoded = match color_space {
        b"DeviceRGB" | b"RGB" => samples
            .get(..pixels.saturating_mul(3))
            .and_then(|raw| RgbImage::from_raw(width, height, raw.to_vec()))
            .map(DynamicImage::ImageRgb8),
        b"DeviceGray" | b"G" => samples
            .get(..pixels)
            .and_then(|raw| GrayImage::from_raw(width, height, raw.to_vec()))
            .map(DynamicImage::ImageLuma8),
        _ => None,
    };

    let Some(decoded) = decoded else {
        trace!(
            "Could not decode {}x{} image ({}) on page {}: {} bytes",
            width,
            height,
            String::from_utf8_lossy(color_space),
            page,
            samples.len()
        );
        return Ok(None);
    };

    let mut data = Vec::new();
    if let Err(e) = decoded.write_to(&mut Cursor::new(&mut data), ImageFormat::Png) {
        trace!(
            "Skipping {}x{} image on page {}: PNG encoding failed: {}",
            width,
            height,
            page,
            e
        );
        return Ok(None);
    }

    Ok(Some(ExtractedImage {
        page,
        index,
        width,
        height,
        extension: "png",
        data,
    }))
}

fn dict_integer(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).and_then(|o| o.as_i64()).ok()
}

/// The stream's filter when exactly one is applied.
fn single_filter(dict: &Dictionary) -> Option<&[u8]> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) if arr.len() == 1 => arr[0].as_name().ok(),
        _ => None,
    }
}
