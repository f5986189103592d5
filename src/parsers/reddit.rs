use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditTarget {
    pub submission_id: String,
    pub comment_id: Option<String>,
}

/// Extract submission and optional comment identifiers from a Reddit
/// permalink.
///
/// The path segment after the literal `comments` segment is the submission
/// id. When the permalink carries a title slug followed by another segment,
/// that trailing segment is only accepted as a comment id if it looks like
/// one (at least four base-36 characters); shorter or non-alphanumeric
/// trailers are part of the title.
pub fn parse(url: &str) -> Option<RedditTarget> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host != "reddit.com" && !host.ends_with(".reddit.com") {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    let comments_index = segments.iter().position(|segment| *segment == "comments")?;
    let submission_id = segments.get(comments_index + 1)?.to_string();

    let comment_id = segments
        .get(comments_index + 3)
        .filter(|candidate| looks_like_comment_id(candidate))
        .map(|candidate| candidate.to_string());

    Some(RedditTarget {
        submission_id,
        comment_id,
    })
}

fn looks_like_comment_id(candidate: &str) -> bool {
    candidate.len() >= 4 && candidate.chars().all(|c| c.is_ascii_alphanumeric())
}
