use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use std::io::Cursor;

/// Below this pixel standard deviation a page is treated as low contrast.
const LOW_CONTRAST_STD_DEV: f64 = 50.0;

/// Returns a cleaned-up PNG when the page looks washed out, `None` when the
/// page is fine as is or cannot be decoded.
/// Pipeline: grayscale -> contrast -> threshold.
pub fn prepare_page(image_bytes: &[u8]) -> Option<Vec<u8>> {
    let img = image::load_from_memory(image_bytes).ok()?;
    let gray = img.to_luma8();
    if !needs_preprocessing(&gray) {
        return None;
    }

    let thresholded = adaptive_threshold(&enhance_contrast(&gray));
    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(thresholded)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .ok()?;
    Some(buffer)
}

/// Heuristic: low std-dev ~= low contrast.
pub fn needs_preprocessing(gray: &GrayImage) -> bool {
    let count = (gray.width() as f64) * (gray.height() as f64);
    if count == 0.0 {
        return false;
    }

    let mean = gray.pixels().map(|p| p[0] as f64).sum::<f64>() / count;
    let variance = gray
        .pixels()
        .map(|p| (p[0] as f64 - mean).powi(2))
        .sum::<f64>()
        / count;

    variance.sqrt() < LOW_CONTRAST_STD_DEV
}

/// Enhance contrast using histogram stretching.
pub fn enhance_contrast(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut result = ImageBuffer::new(width, height);

    let (min_val, max_val) = img.pixels().fold((255u8, 0u8), |(min_v, max_v), pixel| {
        let v = pixel[0];
        (min_v.min(v), max_v.max(v))
    });

    let range = if max_val > min_val {
        (max_val - min_val) as f32
    } else {
        1.0
    };

    for (x, y, pixel) in img.enumerate_pixels() {
        let stretched = ((pixel[0] as f32 - min_val as f32) / range * 255.0) as u8;
        result.put_pixel(x, y, Luma([stretched]));
    }

    result
}

/// Binarize with a threshold picked by Otsu's method.
pub fn adaptive_threshold(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut result = ImageBuffer::new(width, height);

    let mut histogram = [0u32; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total_pixels = (width as f64) * (height as f64);
    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut max_variance = 0.0;
    let mut threshold = 128u8;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }

        let weight_f = total_pixels - weight_b;
        if weight_f == 0.0 {
            break;
        }

        sum_b += i as f64 * count as f64;
        let mean_b = sum_b / weight_b;
        let mean_f = (sum_total - sum_b) / weight_f;

        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);
        if variance > max_variance {
            max_variance = variance;
            threshold = i as u8;
        }
    }

    for (x, y, pixel) in img.enumerate_pixels() {
        let val = if pixel[0] > threshold { 255 } else { 0 };
        result.put_pixel(x, y, Luma([val]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(img: GrayImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_contrast_stretch_spans_full_range() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([100 + x as u8 * 10]));
        let stretched = enhance_contrast(&img);
        assert_eq!(stretched.get_pixel(0, 0)[0], 0);
        assert_eq!(stretched.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn test_threshold_is_binary() {
        let img = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 40 } else { 200 }]));
        let binary = adaptive_threshold(&img);
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(7, 0)[0], 255);
    }

    #[test]
    fn test_high_contrast_page_left_alone() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));
        assert!(prepare_page(&encode_png(img)).is_none());
    }

    #[test]
    fn test_washed_out_page_is_rewritten() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x % 2 == 0 { 150 } else { 170 }]));
        let prepared = prepare_page(&encode_png(img)).unwrap();
        let decoded = image::load_from_memory(&prepared).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_undecodable_bytes_are_skipped() {
        assert!(prepare_page(b"not an image").is_none());
    }
}
