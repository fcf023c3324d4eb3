//! Default tree written on first run when no config file exists.

use chrono::Utc;

use super::types::{Block, BlockColors, DashboardConfig, GlobalColors, GroupCommand};

/// Port used when the persisted config has none.
pub const DEFAULT_PORT: u16 = 8080;

fn plain_colors() -> BlockColors {
    BlockColors {
        background: Some("#fff".to_string()),
        title_color: Some("#333".to_string()),
        title_background: Some("#eee".to_string()),
        title_font_size: Some("1.2em".to_string()),
        value_font_size: Some("1em".to_string()),
        ..BlockColors::default()
    }
}

fn info_colors() -> BlockColors {
    BlockColors {
        background: Some("#f9f9f9".to_string()),
        title_color: Some("#0056b3".to_string()),
        title_background: Some("#e0f2f7".to_string()),
        title_font_size: Some("1.2em".to_string()),
        label_color: Some("#555".to_string()),
        label_background: Some("#f0f0f0".to_string()),
        label_font_size: Some("1em".to_string()),
        value_color: Some("#222".to_string()),
        value_background: Some("#fff".to_string()),
        value_font_size: Some("1em".to_string()),
        ..BlockColors::default()
    }
}

pub fn default_config() -> DashboardConfig {
    DashboardConfig {
        blocks: vec![
            Block::single("Uptime", "uptime", 5).with_colors(plain_colors()),
            Block::single("Disk Usage", "df -h", 10).with_colors(plain_colors()),
            Block::group(
                "System Info",
                vec![
                    GroupCommand::new("Hostname", "%hostname"),
                    GroupCommand::new("Current Time", "%time"),
                    GroupCommand::new("Current Date", "%date"),
                    GroupCommand::new("Username", "%username"),
                    GroupCommand::new("IP Address", "%ip_address"),
                ],
                5,
            )
            .with_colors(info_colors()),
        ],
        last_updated: Utc::now(),
        port: DEFAULT_PORT,
        version: crate::APP_VERSION.to_string(),
        colors: GlobalColors {
            page_background: Some("#f0f0f0".to_string()),
            ..GlobalColors::default()
        },
    }
}
