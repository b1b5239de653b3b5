use anyhow::Result;
use leptess::LepTess;
use log::info;
use std::fs::File;
use std::io::{BufReader, Read};

// Fixed language hints: scanned pages are Russian schoolbooks with the odd
// English fragment.
const OCR_LANGUAGES: &str = "rus+eng";

/// Extract text from an image using Tesseract OCR
pub async fn extract_text_from_image(image_path: &str) -> Result<String> {
    info!("Starting OCR text extraction from image: {}", image_path);

    // Check if the file exists and is readable
    if !std::path::Path::new(image_path).exists() {
        return Err(anyhow::anyhow!("Image file does not exist: {}", image_path));
    }

    let mut tess = LepTess::new(None, OCR_LANGUAGES)
        .map_err(|e| anyhow::anyhow!("Failed to initialize Tesseract OCR: {}", e))?;

    tess.set_image(image_path)
        .map_err(|e| anyhow::anyhow!("Failed to load image for OCR: {}", e))?;

    let extracted_text = tess
        .get_utf8_text()
        .map_err(|e| anyhow::anyhow!("Failed to extract text from image: {}", e))?;

    // Clean up the extracted text (remove extra whitespace and empty lines)
    let cleaned_text = extracted_text
        .trim()
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n");

    info!(
        "OCR extraction completed. Extracted {} characters of text",
        cleaned_text.len()
    );

    Ok(cleaned_text)
}

/// Validate if an image file is supported for OCR processing using image::guess_format
pub fn is_supported_image_format(file_path: &str) -> bool {
    let Ok(file) = File::open(file_path) else {
        info!("Could not open image file for format detection: {file_path}");
        return false;
    };

    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; 32];

    match reader.read(&mut buffer) {
        Ok(bytes_read) if bytes_read >= 8 => {
            buffer.truncate(bytes_read);
            match image::guess_format(&buffer) {
                Ok(format) => {
                    // Tesseract supports: PNG, JPEG/JPG, BMP, TIFF
                    let supported = matches!(
                        format,
                        image::ImageFormat::Png
                            | image::ImageFormat::Jpeg
                            | image::ImageFormat::Bmp
                            | image::ImageFormat::Tiff
                    );
                    info!("Detected image format {format:?} for file {file_path} (supported: {supported})");
                    supported
                }
                Err(e) => {
                    info!("Could not determine image format for file: {file_path} - {e}");
                    false
                }
            }
        }
        Ok(bytes_read) => {
            info!(
                "Could not read enough bytes for format detection: {file_path} (read {bytes_read})"
            );
            false
        }
        Err(e) => {
            info!("Error reading image file for format detection: {file_path} - {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_extract_missing_file_is_error() {
        let result = extract_text_from_image("/non/existent/page.jpg").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_format_detection_rejects_missing_file() {
        assert!(!is_supported_image_format("/non/existent/page.jpg"));
    }

    #[test]
    fn test_format_detection_rejects_non_image() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"just some text, definitely not pixels")
            .unwrap();
        assert!(!is_supported_image_format(
            file.path().to_str().unwrap()
        ));
    }

    #[test]
    fn test_format_detection_accepts_png_magic() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0])
            .unwrap();
        assert!(is_supported_image_format(file.path().to_str().unwrap()));
    }
}
