use std::fmt;
use std::time::Duration;

use serenity::model::id::{ChannelId, UserId};

/// One enqueued audio request. The url is re-resolved into a playable source
/// by the playback loop when the track reaches the head of the queue.
#[derive(Clone, Debug)]
pub struct Track {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
    pub requester: UserId,
    pub requester_name: String,
    pub channel: ChannelId,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}* requested by {}", self.title, self.requester_name)?;

        if let Some(duration) = self.duration {
            let secs = duration.as_secs();
            write!(f, " [length: {}m {}s]", secs / 60, secs % 60)?;
        }

        Ok(())
    }
}

/// hh:mm:ss breakdown used by the `playing` command.
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(duration: Option<Duration>) -> Track {
        Track {
            title: "Never Gonna Give You Up".to_string(),
            url: "https://example.com/watch?v=1".to_string(),
            duration,
            requester: UserId(1),
            requester_name: "alice".to_string(),
            channel: ChannelId(2),
        }
    }

    #[test]
    fn display_without_duration() {
        let rendered = track(None).to_string();
        assert_eq!(rendered, "*Never Gonna Give You Up* requested by alice");
    }

    #[test]
    fn display_with_duration() {
        let rendered = track(Some(Duration::from_secs(213))).to_string();
        assert_eq!(
            rendered,
            "*Never Gonna Give You Up* requested by alice [length: 3m 33s]"
        );
    }

    #[test]
    fn hms_breakdown() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_hms(Duration::from_secs(3600 + 2 * 60 + 3)), "01:02:03");
        assert_eq!(format_hms(Duration::from_secs(25 * 3600)), "25:00:00");
    }
}
