use clap::{Arg, Command};

pub const ARG_MAIL_RELAY_URL: &str = "mail-relay-url";
pub const ARG_MAIL_RELAY_TOKEN: &str = "mail-relay-token";
pub const ARG_MAIL_FROM: &str = "mail-from";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_RELAY_URL)
                .long(ARG_MAIL_RELAY_URL)
                .help("HTTP mail relay endpoint; emails are only logged when unset")
                .env("FORMDESK_MAIL_RELAY_URL"),
        )
        .arg(
            Arg::new(ARG_MAIL_RELAY_TOKEN)
                .long(ARG_MAIL_RELAY_TOKEN)
                .help("Bearer token sent to the mail relay")
                .env("FORMDESK_MAIL_RELAY_TOKEN")
                .hide_env_values(true)
                .requires(ARG_MAIL_RELAY_URL),
        )
        .arg(
            Arg::new(ARG_MAIL_FROM)
                .long(ARG_MAIL_FROM)
                .help("Sender address for outgoing emails")
                .env("FORMDESK_MAIL_FROM")
                .default_value("no-reply@formdesk.local"),
        )
}
