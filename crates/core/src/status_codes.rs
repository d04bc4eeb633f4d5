//! Plain-text meanings of HTTP status codes
//!
//! Includes a number of unofficial codes used by common servers and CDNs.

/// Known status codes and their meanings
const STATUS_CODES: &[(u16, &str)] = &[
    // Information
    (100, "Continue"),
    (101, "Switching Protocols"),
    (102, "Processing (WebDAV, deprecated)"),
    (103, "Early Hints"),
    // Successful
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (207, "Multi-Status (WebDAV)"),
    (208, "Already Reported (WebDAV)"),
    // Redirection
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (306, "Switch Proxy (no longer used)"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    // Client error
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Request Too Large"),
    (414, "Request-URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (418, "I'm a teapot (IETF April Fools' joke)"),
    (421, "Misdirected Request"),
    (422, "Unprocessable Content"),
    (423, "Locked (WebDAV)"),
    (424, "Failed Dependency (WebDAV)"),
    (425, "Too Early"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    // Server error
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage (WebDAV)"),
    (508, "Loop Detected (WebDAV)"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
    // Unofficial
    (218, "This is fine (Apache HTTP Server, unofficial)"),
    (419, "Page Expired (Laravel Framework, unofficial)"),
    (420, "Method Failure (Spring Framework, unofficial)"),
    (509, "Bandwidth Limit Exceeded (Apache Web Server/cPanel, unofficial)"),
    (529, "Site is Overloaded (Qualys, unofficial)"),
    (
        530,
        "Site is Frozen (Pantheon Systems, unofficial), or, See accompanying 1xxx error (Cloudflare, unofficial)",
    ),
    (598, "Network Read Timeout Error (unofficial)"),
    (599, "Network Connect Timeout Error (unofficial)"),
    (440, "Login Time-out (IIS, unofficial)"),
    (449, "Retry With (IIS, unofficial)"),
    (444, "No Response (nginx, unofficial)"),
    (494, "Request header too large (nginx, unofficial)"),
    (495, "SSL Certificate Error (nginx, unofficial)"),
    (496, "SSL Certificate Required (nginx, unofficial)"),
    (497, "HTTP Request Sent to HTTPS Port (nginx, unofficial)"),
    (499, "Client Closed Request (nginx, unofficial)"),
    (520, "Web Server Returned an Unknown Error (Cloudflare, unofficial)"),
    (521, "Web Server Is Down (Cloudflare, unofficial)"),
    (522, "Connection Timed Out (Cloudflare, unofficial)"),
    (523, "Origin Is Unreachable (Cloudflare, unofficial)"),
    (524, "A Timeout Occurred (Cloudflare, unofficial)"),
    (525, "SSL Handshake Failed (Cloudflare, unofficial)"),
    (526, "Invalid SSL Certificate (Cloudflare, unofficial)"),
    (527, "Railgun Error (Cloudflare, unofficial)"),
];

/// Look up the plain-text name of a status code
#[must_use]
pub fn lookup(code: u16) -> Option<&'static str> {
    STATUS_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, meaning)| *meaning)
}

/// Describe a status code as `"404 (Not Found)."`, or `"799."` when unknown
#[must_use]
pub fn meaning(code: u16) -> String {
    match lookup(code) {
        Some(text) => format!("{code} ({text})."),
        None => format!("{code}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code() {
        assert_eq!(meaning(404), "404 (Not Found).");
        assert_eq!(meaning(200), "200 (OK).");
    }

    #[test]
    fn test_unofficial_code() {
        assert_eq!(meaning(522), "522 (Connection Timed Out (Cloudflare, unofficial)).");
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(meaning(799), "799.");
        assert_eq!(lookup(799), None);
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<u16> = STATUS_CODES.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        let before = codes.len();
        codes.dedup();
        assert_eq!(before, codes.len());
    }
}
