//! Terminal implementation of [`Interaction`].

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::auth::{DeviceAuthorization, Interaction, PollProgress, TokenRecord};

/// Prompts on stdout/stdin and draws poll progress on stderr.
pub struct TerminalInteraction {
    offer_browser: bool,
    polling: AtomicBool,
    prompting: AtomicBool,
}

impl TerminalInteraction {
    pub fn new(offer_browser: bool) -> Self {
        Self {
            offer_browser,
            polling: AtomicBool::new(false),
            prompting: AtomicBool::new(false),
        }
    }

    /// `true` while blocked on a stdin answer.
    pub fn is_prompting(&self) -> bool {
        self.prompting.load(Ordering::Relaxed)
    }

    /// End the progress line, if one was drawn.
    pub fn finish_progress(&self) {
        if self.polling.swap(false, Ordering::Relaxed) {
            eprintln!();
        }
    }

    fn confirm(&self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint} ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        self.prompting.store(true, Ordering::Relaxed);
        let read = io::stdin().lock().read_line(&mut answer);
        self.prompting.store(false, Ordering::Relaxed);
        match read {
            Ok(0) | Err(_) => default,
            Ok(_) => parse_answer(&answer, default),
        }
    }
}

impl Interaction for TerminalInteraction {
    fn confirm_reauthentication(&self, _existing: &TokenRecord) -> bool {
        self.confirm("You're already logged in. Do you want to log in again?", false)
    }

    fn present_authorization(&self, authorization: &DeviceAuthorization) {
        println!();
        println!("Device Authorization Required");
        println!();
        println!("Please visit: {}", authorization.verification_uri_complete);
        println!("Enter code:   {}", authorization.user_code);
        println!();

        if self.offer_browser && self.confirm("Open browser automatically?", true) {
            if let Err(err) = webbrowser::open(&authorization.verification_uri_complete) {
                tracing::warn!(error = %err, "failed to open browser");
                println!("Could not open a browser; open the URL above manually.");
            }
        }

        println!(
            "Waiting for authorization (expires in {} minutes)...",
            authorization.expires_in / 60
        );
    }

    fn confirm_logout(&self, user_name: &str) -> bool {
        self.confirm(
            &format!("Are you sure you want to log out? ({user_name})"),
            false,
        )
    }

    fn on_poll(&self, progress: PollProgress) {
        self.polling.store(true, Ordering::Relaxed);
        let dots = (progress.attempt % 4) as usize;
        eprint!(
            "\rPolling for authorization{}{} ({}s)",
            ".".repeat(dots),
            " ".repeat(3 - dots),
            progress.elapsed.as_secs()
        );
        let _ = io::stderr().flush();
    }
}

/// Interpret a yes/no answer; anything unrecognized keeps `default`.
pub fn parse_answer(input: &str, default: bool) -> bool {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
