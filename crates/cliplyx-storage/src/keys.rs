//! Storage key layout for clip artifacts.
//!
//! Clip media and captions share one path, differing only by extension:
//! `{userId}/{jobId}/clip-{windowStart}-{format}.mp4|.srt`. Source media
//! lives under a separate uploader-keyed namespace owned by the upload API.

use cliplyx_models::ClipFormat;

/// Key of the encoded media file for one (window, format) clip.
pub fn clip_key(user_id: &str, job_id: &str, window_start: f64, format: ClipFormat) -> String {
    format!(
        "{}/{}/clip-{}-{}.mp4",
        user_id,
        job_id,
        window_start as u64,
        format
    )
}

/// Key of the caption file for one (window, format) clip.
pub fn captions_key(user_id: &str, job_id: &str, window_start: f64, format: ClipFormat) -> String {
    format!(
        "{}/{}/clip-{}-{}.srt",
        user_id,
        job_id,
        window_start as u64,
        format
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            clip_key("user-1", "job-9", 15.0, ClipFormat::Vertical),
            "user-1/job-9/clip-15-vertical.mp4"
        );
        assert_eq!(
            captions_key("user-1", "job-9", 15.0, ClipFormat::Vertical),
            "user-1/job-9/clip-15-vertical.srt"
        );
    }

    #[test]
    fn test_media_and_caption_keys_share_path() {
        let media = clip_key("u", "j", 30.0, ClipFormat::Feed);
        let captions = captions_key("u", "j", 30.0, ClipFormat::Feed);
        assert_eq!(
            media.trim_end_matches(".mp4"),
            captions.trim_end_matches(".srt")
        );
    }
}
