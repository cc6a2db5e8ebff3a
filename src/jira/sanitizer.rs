/// Sanitizes rich-text HTML from the ticket tracker before it is stored in a
/// ticket description
///
/// Pure function; applied once at ingestion so the room only ever holds
/// sanitized markup.
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}
