//! Common validation utilities.

use validator::ValidationError;

/// Minimum testimonial body length in characters (after trimming).
pub const TESTIMONIAL_TEXT_MIN: usize = 10;

/// Maximum testimonial body length in characters (after trimming).
pub const TESTIMONIAL_TEXT_MAX: usize = 500;

/// Maximum author display name length in characters.
pub const AUTHOR_NAME_MAX: usize = 100;

/// Video references accepted on submission.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".wmv", ".webm", ".mpeg", ".mpg"];

/// Photo references accepted on submission.
pub const PHOTO_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

lazy_static::lazy_static! {
    static ref CATEGORY_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]*$").unwrap();
}

/// Validates that a rating is within the 1-5 star range.
pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rating_range");
        err.message = Some("Rating must be between 1 and 5".into());
        Err(err)
    }
}

/// Validates that a rule priority is within the 1-10 range.
pub fn validate_priority(priority: i32) -> Result<(), ValidationError> {
    if (1..=10).contains(&priority) {
        Ok(())
    } else {
        let mut err = ValidationError::new("priority_range");
        err.message = Some("Priority must be between 1 and 10".into());
        Err(err)
    }
}

/// Validates testimonial body text: 10-500 characters after trimming.
///
/// Counts characters, not bytes, so multi-byte text is not penalized.
pub fn validate_testimonial_text(text: &str) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();
    if (TESTIMONIAL_TEXT_MIN..=TESTIMONIAL_TEXT_MAX).contains(&len) {
        Ok(())
    } else {
        let mut err = ValidationError::new("text_length");
        err.message = Some("Testimonial text must be between 10 and 500 characters".into());
        Err(err)
    }
}

/// Validates a category label: letters, digits, spaces, underscores, hyphens.
pub fn validate_category_label(label: &str) -> Result<(), ValidationError> {
    if label.chars().count() <= 50 && CATEGORY_REGEX.is_match(label) {
        Ok(())
    } else {
        let mut err = ValidationError::new("category_label");
        err.message = Some(
            "Category must be 1-50 characters: letters, digits, spaces, underscores, hyphens"
                .into(),
        );
        Err(err)
    }
}

/// Validates a hosted video reference by extension.
pub fn validate_video_url(url: &str) -> Result<(), ValidationError> {
    validate_media_url(url, VIDEO_EXTENSIONS, "video_url", "Unsupported video format")
}

/// Validates a hosted photo reference by extension.
pub fn validate_photo_url(url: &str) -> Result<(), ValidationError> {
    validate_media_url(url, PHOTO_EXTENSIONS, "photo_url", "Unsupported photo format")
}

fn validate_media_url(
    url: &str,
    extensions: &[&str],
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    let lowered = url.to_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        let mut err = ValidationError::new(code);
        err.message = Some("Media references must be http(s) URLs".into());
        return Err(err);
    }
    // Ignore any query string when checking the extension.
    let path = lowered.split('?').next().unwrap_or(&lowered);
    if extensions.iter().any(|ext| path.ends_with(ext)) {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        Err(err)
    }
}
