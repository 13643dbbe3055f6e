//! Class check-in tokens and the request sent to the external QR renderer.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    #[error("token must end with -YYYY-MM-DD")]
    MissingDate,

    #[error("token has an empty class label")]
    EmptyClassLabel,
}

/// `"{classLabel}-{YYYY-MM-DD}"`. Same inputs always give the same token.
pub fn generate_token(class_label: &str, date: NaiveDate) -> String {
    format!("{}-{}", class_label, date.format("%Y-%m-%d"))
}

/// Inverse of `generate_token`. The class label may itself contain dashes.
pub fn parse_token(token: &str) -> Result<(String, NaiveDate), QrError> {
    let token = token.trim();
    // "-YYYY-MM-DD" is 11 bytes.
    if token.len() < 11 || !token.is_char_boundary(token.len() - 11) {
        return Err(QrError::MissingDate);
    }
    let (label, tail) = token.split_at(token.len() - 11);
    let Some(date_str) = tail.strip_prefix('-') else {
        return Err(QrError::MissingDate);
    };
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| QrError::MissingDate)?;
    if label.trim().is_empty() {
        return Err(QrError::EmptyClassLabel);
    }
    Ok((label.to_string(), date))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRenderSettings {
    pub base_url: String,
    pub size: u32,
    pub bg_color: String,
    pub color: String,
    pub quiet_zone: u32,
}

impl Default for QrRenderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            size: 250,
            bg_color: "f5f5f5".to_string(),
            color: "a052de".to_string(),
            quiet_zone: 1,
        }
    }
}

/// Rendering request for `token`. `cache_bust` adds a `t=` parameter so a
/// regenerate fetches a fresh image without changing the token.
pub fn render_url(settings: &QrRenderSettings, token: &str, cache_bust: Option<i64>) -> String {
    let mut url = format!(
        "{}?size={s}x{s}&data={}&bgcolor={}&color={}&qzone={}",
        settings.base_url,
        urlencoding::encode(token),
        settings.bg_color,
        settings.color,
        settings.quiet_zone,
        s = settings.size,
    );
    if let Some(t) = cache_bust {
        url.push_str(&format!("&t={}", t));
    }
    url
}

pub fn download_filename(class_label: &str, date: NaiveDate) -> String {
    format!("QR_Absensi_{}_{}.png", class_label, date.format("%d-%m-%Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    #[test]
    fn token_format() {
        assert_eq!(generate_token("XII RPL 1", d(2025, 9, 30)), "XII RPL 1-2025-09-30");
        assert_eq!(
            generate_token("XII RPL 1", d(2025, 9, 30)),
            generate_token("XII RPL 1", d(2025, 9, 30))
        );
    }

    #[test]
    fn parse_reverses_generate() {
        let token = generate_token("X-MM 3", d(2025, 1, 2));
        assert_eq!(parse_token(&token), Ok(("X-MM 3".to_string(), d(2025, 1, 2))));
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        assert_eq!(parse_token("XII RPL 1"), Err(QrError::MissingDate));
        assert_eq!(parse_token("XII RPL 1-2025-13-01"), Err(QrError::MissingDate));
        assert_eq!(parse_token("XII RPL 1 2025-09-30"), Err(QrError::MissingDate));
        assert_eq!(parse_token(" -2025-09-30"), Err(QrError::EmptyClassLabel));
    }

    #[test]
    fn render_url_encodes_token() {
        let url = render_url(&QrRenderSettings::default(), "XII RPL 1-2025-09-30", None);
        assert_eq!(
            url,
            "https://api.qrserver.com/v1/create-qr-code/?size=250x250&data=XII%20RPL%201-2025-09-30&bgcolor=f5f5f5&color=a052de&qzone=1"
        );
        let busted = render_url(&QrRenderSettings::default(), "A-2025-09-30", Some(1700));
        assert!(busted.ends_with("&t=1700"));
        assert!(busted.contains("data=A-2025-09-30"));
    }

    #[test]
    fn filename_uses_day_first_date() {
        assert_eq!(
            download_filename("XII RPL 1", d(2025, 9, 30)),
            "QR_Absensi_XII RPL 1_30-09-2025.png"
        );
    }
}
