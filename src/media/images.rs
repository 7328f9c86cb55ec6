// Slideshow image sources: a local folder, optionally ranked against the
// summary text, or a Wikimedia Commons search.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{MediaError, MediaResult};
use crate::nlp::sentences::tokenize;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

const COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported images directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| is_image(p))
        .collect();

    if images.is_empty() {
        return Err(MediaError::NoImages(format!(
            "no supported images found in {}",
            dir.display()
        )));
    }
    Ok(images)
}

fn filename_tokens(path: &Path) -> Vec<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(String::from)
        .collect()
}

/// Orders images by how many of their file-name words occur in `summary`.
/// Equal scores keep the incoming order.
pub fn rank_images(images: Vec<PathBuf>, summary: &str) -> Vec<PathBuf> {
    let vocabulary: HashSet<String> = tokenize(summary).into_iter().collect();
    let mut scored: Vec<(usize, PathBuf)> = images
        .into_iter()
        .map(|path| {
            let hits = filename_tokens(&path)
                .iter()
                .filter(|t| vocabulary.contains(t.as_str()))
                .count();
            (hits, path)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, path)| path).collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: Option<String>,
}

// (file name, download url) in search-rank order, non-image files skipped.
fn image_candidates(response: SearchResponse) -> Vec<(String, String)> {
    let mut pages: Vec<Page> = response
        .query
        .map(|q| q.pages.into_values().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p.index);

    pages
        .into_iter()
        .filter_map(|page| {
            let url = page.imageinfo.into_iter().next()?.url?;
            if !is_image(Path::new(&url)) {
                return None;
            }
            let title = if page.title.is_empty() { "image".to_string() } else { page.title };
            let name = title
                .trim_start_matches("File:")
                .replace([' ', '/', '\\'], "_");
            Some((name, url))
        })
        .collect()
}

/// Downloads search results from Wikimedia Commons.
pub struct WikimediaImageSource {
    client: reqwest::blocking::Client,
}

impl WikimediaImageSource {
    pub fn new() -> MediaResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("granth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn fetch(&self, query: &str, output_dir: &Path, count: usize) -> MediaResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;
        let limit = (count.max(1) * 2).to_string();
        let url = reqwest::Url::parse_with_params(
            COMMONS_API,
            &[
                ("action", "query"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrnamespace", "6"),
                ("gsrlimit", limit.as_str()),
                ("prop", "imageinfo"),
                ("iiprop", "url"),
                ("format", "json"),
            ],
        )
        .map_err(|e| MediaError::BadResponse(e.to_string()))?;

        let response: SearchResponse = self.client.get(url).send()?.error_for_status()?.json()?;

        let mut images = Vec::new();
        for (name, url) in image_candidates(response) {
            if images.len() >= count {
                break;
            }
            let resp = self.client.get(&url).send()?;
            if !resp.status().is_success() {
                tracing::warn!(%url, status = %resp.status(), "skipping image");
                continue;
            }
            let path = output_dir.join(name);
            fs::write(&path, resp.bytes()?)?;
            tracing::debug!(path = %path.display(), "downloaded image");
            images.push(path);
        }

        if images.is_empty() {
            return Err(MediaError::NoImages(format!(
                "could not download images for {:?} from Wikimedia Commons",
                query
            )));
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_list_images_filters_and_sorts() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b.PNG"), b"x")?;
        fs::write(dir.path().join("a.jpg"), b"x")?;
        fs::write(dir.path().join("notes.txt"), b"x")?;
        fs::create_dir(dir.path().join("nested.jpg"))?;

        let images = list_images(dir.path())?;
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
        Ok(())
    }

    #[test]
    fn test_list_images_empty_dir() -> Result<()> {
        let dir = TempDir::new()?;
        assert!(matches!(list_images(dir.path()), Err(MediaError::NoImages(_))));
        Ok(())
    }

    #[test]
    fn test_rank_images_scores_filenames() -> Result<()> {
        let dir = TempDir::new()?;
        for name in ["health_sleep.png", "mindset_growth.jpg", "neutral.webp"] {
            fs::write(dir.path().join(name), b"x")?;
        }
        let summary = "यह अध्याय growth mindset और positive health आदतों पर आधारित है।";
        let ranked = rank_images(list_images(dir.path())?, summary);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].file_name().unwrap(), "mindset_growth.jpg");
        assert_eq!(ranked[1].file_name().unwrap(), "health_sleep.png");
        assert_eq!(ranked[2].file_name().unwrap(), "neutral.webp");
        Ok(())
    }

    #[test]
    fn test_rank_images_keeps_order_on_ties() {
        let images = vec![PathBuf::from("z.jpg"), PathBuf::from("a.jpg")];
        assert_eq!(rank_images(images.clone(), "कुछ नहीं"), images);
    }

    #[test]
    fn test_image_candidates_follow_search_rank() -> Result<()> {
        let payload = json!({
            "query": { "pages": {
                "20": { "index": 2, "title": "File:Second image.png", "imageinfo": [{ "url": "https://x/b.png" }] },
                "10": { "index": 1, "title": "File:First.JPG", "imageinfo": [{ "url": "https://x/a.JPG" }] },
                "30": { "index": 3, "title": "File:Doc.pdf", "imageinfo": [{ "url": "https://x/c.pdf" }] },
                "40": { "index": 4, "title": "File:Missing.png" }
            }}
        });
        let response: SearchResponse = serde_json::from_value(payload)?;
        let candidates = image_candidates(response);
        assert_eq!(
            candidates,
            vec![
                ("First.JPG".to_string(), "https://x/a.JPG".to_string()),
                ("Second_image.png".to_string(), "https://x/b.png".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_image_candidates_without_results() -> Result<()> {
        let response: SearchResponse = serde_json::from_value(json!({ "batchcomplete": "" }))?;
        assert!(image_candidates(response).is_empty());
        Ok(())
    }
}
