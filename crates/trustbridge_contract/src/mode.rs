use crate::envelope::DataSource;

pub const DEMO_BANNER_TITLE: &str = "Demo Mode Active";
pub const DEMO_BANNER_TEXT: &str = "Unable to connect to backend services. Displaying demo data for preview purposes. Some features may not work as expected.";

/// Small badge telling the user whether shown data is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoIndicator {
    pub source: DataSource,
}

impl DemoIndicator {
    pub fn for_source(source: DataSource) -> Self {
        Self { source }
    }

    pub fn from_flag(is_demo: bool) -> Self {
        Self::for_source(if is_demo {
            DataSource::Simulated
        } else {
            DataSource::Live
        })
    }

    pub fn label(&self) -> &'static str {
        match self.source {
            DataSource::Live => "Live Data",
            DataSource::Simulated => "Demo Mode",
        }
    }
}

/// Dismissable warning shown while results are simulated.
#[derive(Debug, Clone, Default)]
pub struct DemoBanner {
    dismissed: bool,
}

impl DemoBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// Banner text to show for `source`, or `None` when nothing should be shown.
    pub fn render(&self, source: DataSource) -> Option<String> {
        if self.dismissed || source == DataSource::Live {
            return None;
        }
        Some(format!("{DEMO_BANNER_TITLE}: {DEMO_BANNER_TEXT}"))
    }
}
