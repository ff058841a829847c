use crate::error::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tokio::fs;
use tokio::process::Command;

/// Rasterizes each PDF page to a 150 dpi PNG and returns them
/// base64-encoded, in page order. Uses poppler's `pdftoppm` through a
/// per-call temp dir that is removed before returning.
pub async fn pdf_to_images(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    let temp_dir = format!("/tmp/mcq_pages_{}", uuid::Uuid::new_v4());
    fs::create_dir_all(&temp_dir).await?;

    let pdf_path = format!("{}/input.pdf", temp_dir);
    if let Err(e) = fs::write(&pdf_path, pdf_bytes).await {
        let _ = fs::remove_dir_all(&temp_dir).await;
        return Err(e.into());
    }

    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg("150")
        .arg(&pdf_path)
        .arg(format!("{}/page", temp_dir))
        .output()
        .await;

    match output {
        Ok(out) => {
            if !out.status.success() {
                tracing::error!("pdftoppm failed: {}", String::from_utf8_lossy(&out.stderr));
                let _ = fs::remove_dir_all(&temp_dir).await;
                return Err(anyhow::anyhow!("PDF conversion failed").into());
            }
        }
        Err(e) => {
            tracing::error!("Failed to run pdftoppm: {}", e);
            let _ = fs::remove_dir_all(&temp_dir).await;
            return Err(anyhow::anyhow!("pdftoppm not available").into());
        }
    }

    let mut image_files = Vec::new();
    let mut entries = fs::read_dir(&temp_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        if entry_path.extension().and_then(|e| e.to_str()) == Some("png") {
            image_files.push(entry_path);
        }
    }

    image_files.sort_by_key(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string());

    let mut images = Vec::new();
    for img_path in image_files {
        if let Ok(data) = fs::read(&img_path).await {
            images.push(BASE64.encode(&data));
        }
    }

    let _ = fs::remove_dir_all(&temp_dir).await;
    Ok(images)
}

/// Extracts the plain text layer of a PDF with poppler's `pdftotext`.
/// Returns an empty string for image-only PDFs.
pub async fn pdf_to_text(pdf_bytes: &[u8]) -> Result<String> {
    let temp_dir = format!("/tmp/mcq_text_{}", uuid::Uuid::new_v4());
    fs::create_dir_all(&temp_dir).await?;

    let pdf_path = format!("{}/input.pdf", temp_dir);
    if let Err(e) = fs::write(&pdf_path, pdf_bytes).await {
        let _ = fs::remove_dir_all(&temp_dir).await;
        return Err(e.into());
    }

    let output = Command::new("pdftotext")
        .arg(&pdf_path)
        .arg("-")
        .output()
        .await;

    let _ = fs::remove_dir_all(&temp_dir).await;

    match output {
        Ok(out) => {
            if !out.status.success() {
                tracing::error!("pdftotext failed: {}", String::from_utf8_lossy(&out.stderr));
                return Err(anyhow::anyhow!("PDF text extraction failed").into());
            }
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        }
        Err(e) => {
            tracing::error!("Failed to run pdftotext: {}", e);
            Err(anyhow::anyhow!("pdftotext not available").into())
        }
    }
}
