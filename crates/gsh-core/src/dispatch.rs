//! Routes incoming "view" and "send" requests to the script picker.
//!
//! The dispatcher only validates; it never touches the catalogue. A request
//! is forwarded when it carries a URI with a supported scheme in the slot its
//! action reads from (`data` for view, `stream` for send).

use url::Url;

use crate::script_name::is_supported_scheme;

/// Result code reported when a request is not forwarded.
pub const UNSUPPORTED_URI: i32 = 1;

/// Category marking a request that came from a browser.
pub const CATEGORY_BROWSABLE: &str = "browsable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Send,
    /// Any action the dispatcher does not handle.
    Other,
}

impl Action {
    pub fn parse(s: &str) -> Self {
        match s {
            "view" => Action::View,
            "send" => Action::Send,
            _ => Action::Other,
        }
    }
}

/// An incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub action: Option<Action>,
    /// URI read by `View`.
    pub data: Option<Url>,
    /// URI read by `Send`.
    pub stream: Option<Url>,
    pub categories: Vec<String>,
}

impl Intent {
    pub fn view(uri: Url) -> Self {
        Self {
            action: Some(Action::View),
            data: Some(uri),
            ..Self::default()
        }
    }

    pub fn send(uri: Url) -> Self {
        Self {
            action: Some(Action::Send),
            stream: Some(uri),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// What the picker is asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRequest {
    pub uri: Url,
    pub browsable: bool,
    /// The picker's result goes back to whoever sent the original request.
    pub forward_result: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("no action given")]
    MissingAction,
    #[error("unsupported action")]
    UnsupportedAction,
    #[error("invalid arguments")]
    InvalidArguments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Picker(PickerRequest),
    Rejected(Rejection),
}

impl Dispatch {
    /// `0` when forwarded, `UNSUPPORTED_URI` otherwise.
    pub fn result_code(&self) -> i32 {
        match self {
            Dispatch::Picker(_) => 0,
            Dispatch::Rejected(_) => UNSUPPORTED_URI,
        }
    }
}

pub fn dispatch(intent: &Intent) -> Dispatch {
    let uri = match intent.action {
        None => return reject(Rejection::MissingAction),
        Some(Action::View) => intent.data.as_ref(),
        Some(Action::Send) => intent.stream.as_ref(),
        Some(Action::Other) => return reject(Rejection::UnsupportedAction),
    };

    match uri {
        Some(uri) if is_supported_scheme(uri.scheme()) => {
            let browsable =
                intent.has_category(CATEGORY_BROWSABLE) || uri.scheme().starts_with("http");
            tracing::debug!(%uri, browsable, "forwarding to script picker");
            Dispatch::Picker(PickerRequest {
                uri: uri.clone(),
                browsable,
                forward_result: true,
            })
        }
        _ => reject(Rejection::InvalidArguments),
    }
}

fn reject(reason: Rejection) -> Dispatch {
    tracing::info!("request rejected: {}", reason);
    Dispatch::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn view_file_uri_is_forwarded() {
        let d = dispatch(&Intent::view(url("file:///sdcard/hello.groovy")));
        assert_eq!(
            d,
            Dispatch::Picker(PickerRequest {
                uri: url("file:///sdcard/hello.groovy"),
                browsable: false,
                forward_result: true,
            })
        );
        assert_eq!(d.result_code(), 0);
    }

    #[test]
    fn http_schemes_are_browsable() {
        for uri in ["http://example.com/a.groovy", "https://example.com/a.groovy"] {
            match dispatch(&Intent::view(url(uri))) {
                Dispatch::Picker(req) => assert!(req.browsable, "{uri}"),
                other => panic!("{uri}: {other:?}"),
            }
        }
    }

    #[test]
    fn browsable_category_is_carried_over() {
        let intent = Intent::send(url("content://media/42")).with_category(CATEGORY_BROWSABLE);
        match dispatch(&intent) {
            Dispatch::Picker(req) => {
                assert!(req.browsable);
                assert_eq!(req.uri, url("content://media/42"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn send_reads_stream_not_data() {
        let mut intent = Intent::send(url("resource://org.example/raw/x.groovy"));
        intent.data = Some(url("ftp://example.com/ignored"));
        assert!(matches!(dispatch(&intent), Dispatch::Picker(_)));

        let intent = Intent {
            action: Some(Action::Send),
            data: Some(url("file:///tmp/a.groovy")),
            ..Intent::default()
        };
        assert_eq!(
            dispatch(&intent),
            Dispatch::Rejected(Rejection::InvalidArguments)
        );
    }

    #[test]
    fn unsupported_scheme_is_invalid_arguments() {
        let d = dispatch(&Intent::view(url("ftp://example.com/a.groovy")));
        assert_eq!(d, Dispatch::Rejected(Rejection::InvalidArguments));
        assert_eq!(d.result_code(), UNSUPPORTED_URI);

        let d = dispatch(&Intent {
            action: Some(Action::View),
            ..Intent::default()
        });
        assert_eq!(d, Dispatch::Rejected(Rejection::InvalidArguments));
    }

    #[test]
    fn unknown_or_missing_action_is_rejected() {
        let mut intent = Intent::view(url("file:///tmp/a.groovy"));
        intent.action = Some(Action::parse("edit"));
        assert_eq!(
            dispatch(&intent),
            Dispatch::Rejected(Rejection::UnsupportedAction)
        );

        intent.action = None;
        let d = dispatch(&intent);
        assert_eq!(d, Dispatch::Rejected(Rejection::MissingAction));
        assert_eq!(d.result_code(), UNSUPPORTED_URI);
    }
}
