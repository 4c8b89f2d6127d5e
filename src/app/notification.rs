use crate::error::UploaderError;
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIcon {
    Info,
    Error,
    Success,
}

/// Continuation run once the user confirms a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissAction {
    Nothing,
    /// Clear the file picker and replay the selection-changed signal.
    ResetSelection,
    Navigate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub icon: NotificationIcon,
    pub title: String,
    pub text: String,
    pub confirm_label: String,
    pub confirm_color: Option<String>,
    /// Blocking spinner without a confirm button.
    pub loading: bool,
    pub on_dismiss: DismissAction,
}

impl Notification {
    fn new(icon: NotificationIcon, title: &str, text: &str) -> Self {
        Self {
            icon,
            title: title.to_string(),
            text: text.to_string(),
            confirm_label: "OK".to_string(),
            confirm_color: None,
            loading: false,
            on_dismiss: DismissAction::Nothing,
        }
    }

    pub fn loading(title: &str, text: &str) -> Self {
        Self {
            loading: true,
            ..Self::new(NotificationIcon::Info, title, text)
        }
    }

    pub fn error(title: &str, text: &str) -> Self {
        Self::new(NotificationIcon::Error, title, text)
    }

    pub fn success(title: &str, text: &str) -> Self {
        Self::new(NotificationIcon::Success, title, text)
    }

    pub fn confirm_label(mut self, label: &str) -> Self {
        self.confirm_label = label.to_string();
        self
    }

    pub fn confirm_color(mut self, hex: &str) -> Self {
        self.confirm_color = Some(hex.to_string());
        self
    }

    pub fn then(mut self, action: DismissAction) -> Self {
        self.on_dismiss = action;
        self
    }
}

/// Single modal slot: showing a notification replaces whatever was open.
#[derive(Debug, Default)]
pub struct NotificationPresenter {
    current: Option<Notification>,
}

impl NotificationPresenter {
    pub fn show(&mut self, notification: Notification) {
        self.current = Some(notification);
    }

    /// Closes the open notification without running its continuation.
    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// User confirmation. Loading notifications cannot be dismissed.
    pub fn dismiss(&mut self) -> Option<DismissAction> {
        match &self.current {
            Some(notification) if !notification.loading => {
                self.current.take().map(|n| n.on_dismiss)
            }
            _ => None,
        }
    }
}

/// Where the "navigate to result page" side effect goes.
pub trait Navigator: Send {
    fn navigate(&self, url: &Url) -> Result<(), UploaderError>;
}

/// Opens the result page in the system browser.
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &Url) -> Result<(), UploaderError> {
        open::that(url.as_str()).map_err(|e| UploaderError::Redirect {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Server redirects are usually site-relative (`/invoices/1`).
pub fn resolve_redirect(base: &Url, target: &str) -> Result<Url, UploaderError> {
    base.join(target).map_err(|e| UploaderError::Redirect {
        url: target.to_string(),
        reason: e.to_string(),
    })
}
