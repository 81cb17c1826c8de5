use anyhow::{bail, Result};
use speechfetch_core::{AudioSource, YouTubeDownloader};

pub fn run(urls: &[String]) -> Result<()> {
    let source = YouTubeDownloader::default();
    let mut invalid = 0;

    for url in urls {
        match source.extract_video_id(url) {
            Some(id) => println!("valid    {}  ({})", url, id),
            None => {
                println!("invalid  {}", url);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{} of {} URLs are not {} video URLs", invalid, urls.len(), source.source_name());
    }

    Ok(())
}
