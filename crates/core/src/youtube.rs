use url::Url;

use crate::{
    error::{PlannerError, Result},
    types::{SourceId, SourceRequest},
};

/// Extract the video id from the URL shapes YouTube hands out.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    match host {
        "youtu.be" => parsed
            .path_segments()?
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        "youtube.com" | "m.youtube.com" => {
            if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
                if !v.is_empty() {
                    return Some(v.into_owned());
                }
            }

            let parts: Vec<&str> = parsed.path_segments()?.filter(|p| !p.is_empty()).collect();
            ["shorts", "embed"].iter().find_map(|marker| {
                let pos = parts.iter().position(|p| p == marker)?;
                parts.get(pos + 1).map(|id| id.to_string())
            })
        }
        _ => None,
    }
}

/// Deep link to `start` seconds into `base`, replacing any existing `t` parameter.
pub fn build_segment_url(base: &str, start: f64) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return base.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "t")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let start = if start.is_finite() && start > 0.0 {
        start.floor() as u64
    } else {
        0
    };

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("t", &start.to_string());

    url.to_string()
}

/// Turn user input (one URL per line) into source requests, skipping blank lines.
pub fn source_requests<'a, I>(lines: I) -> Result<Vec<SourceRequest>>
where
    I: IntoIterator<Item = &'a str>,
{
    let requests = lines
        .into_iter()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            extract_video_id(line)
                .map(|id| SourceRequest {
                    id: SourceId(id),
                    url: line.to_string(),
                })
                .ok_or_else(|| PlannerError::InvalidSourceUrl {
                    url: line.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    if requests.is_empty() {
        return Err(PlannerError::NoSources);
    }

    Ok(requests)
}
