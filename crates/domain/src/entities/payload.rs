//! Raw response payloads

/// Raw response body as returned by the network or the cache
///
/// Payloads are opaque bytes until parsed into an
/// [`EutilsResponse`](crate::EutilsResponse).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponsePayload(Vec<u8>);

impl ResponsePayload {
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the payload as UTF-8 text
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<Vec<u8>> for ResponsePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for ResponsePayload {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<&str> for ResponsePayload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_access() {
        let payload = ResponsePayload::from("<xml/>");
        assert_eq!(payload.as_text(), Some("<xml/>"));
        assert_eq!(payload.len(), 6);
        assert!(!payload.is_empty());
    }

    #[test]
    fn invalid_utf8_has_no_text() {
        let payload = ResponsePayload::new(vec![0xff, 0xfe]);
        assert!(payload.as_text().is_none());
    }
}
