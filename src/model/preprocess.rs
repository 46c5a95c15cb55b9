use std::io::Cursor;

use image::{DynamicImage, ImageReader, imageops::FilterType};

use crate::{
    error::ServiceError,
    model::types::{INPUT_SIZE, ImageTensor},
};

/// Decodes an uploaded image, sniffing the format from its content rather
/// than trusting the extension.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ServiceError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

pub fn to_tensor(img: &DynamicImage) -> Result<ImageTensor, ServiceError> {
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
    let pixels = resized
        .to_rgb8()
        .into_raw()
        .into_iter()
        .map(f32::from)
        .collect();
    ImageTensor::new(pixels)
}

pub fn prepare(bytes: &[u8]) -> Result<ImageTensor, ServiceError> {
    let img = decode(bytes)?;
    to_tensor(&img)
}
