/// Fan-out to live dashboard subscribers. Fire-and-forget.
pub trait LiveUpdateBroadcaster: Send + Sync {
    fn broadcast_dashboard_changed(&self, source: &str);
}
