//! Message templates
//!
//! Each template returns a complete [`OutgoingEmail`] with a plain-text body
//! and an HTML alternative. Interpolated values are HTML-escaped.

use chrono::NaiveDate;

use crate::sender::OutgoingEmail;

const FOOTER: &str = "This email was sent automatically by Daily Check-In. Please do not reply.";

const STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; } \
.container { max-width: 600px; margin: 0 auto; padding: 20px; } \
.header { color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; } \
.content { background: #f9fafb; padding: 30px; border: 1px solid #e5e7eb; border-top: none; border-radius: 0 0 8px 8px; } \
.notice { border-radius: 8px; padding: 20px; margin: 20px 0; } \
.footer { text-align: center; margin-top: 20px; color: #6b7280; font-size: 12px; }";

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(header_color: &str, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <div class="header" style="background: {header_color};">
      <h1>{title}</h1>
    </div>
    <div class="content">
{body}
    </div>
    <div class="footer">
      <p>{FOOTER}</p>
    </div>
  </div>
</body>
</html>"#
    )
}

/// Alert for an emergency contact whose user missed a day
pub fn missed_check_in_alert(
    to: &str,
    contact_name: &str,
    user_name: &str,
    missed_date: NaiveDate,
) -> OutgoingEmail {
    let subject = format!("[Safety alert] {user_name} did not check in yesterday");

    let text = format!(
        "Dear {contact_name},\n\n\
         {user_name} listed you as an emergency contact.\n\n\
         They did not complete their daily check-in on {missed_date}.\n\n\
         Please get in touch with them to make sure they are safe.\n\n\
         ---\n{FOOTER}"
    );

    let body = format!(
        r#"      <p>Dear <strong>{contact}</strong>,</p>
      <p><strong>{user}</strong> listed you as an emergency contact.</p>
      <div class="notice" style="background: #fef2f2; border: 1px solid #fecaca;">
        <p>They did not complete their daily check-in on <strong>{missed_date}</strong>.</p>
      </div>
      <p><strong>Please get in touch with them to make sure they are safe.</strong></p>"#,
        contact = escape(contact_name),
        user = escape(user_name),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text,
        html: Some(page("#ef4444", "Safety alert", &body)),
    }
}

/// Nudge for a user who has not checked in yet today
pub fn check_in_reminder(to: &str, user_name: &str, date: NaiveDate) -> OutgoingEmail {
    let subject = "[Reminder] You have not checked in today".to_string();

    let text = format!(
        "Hi {user_name},\n\n\
         You have not completed your daily check-in for {date} yet.\n\n\
         If you miss the whole day, your emergency contacts will be notified.\n\n\
         ---\n{FOOTER}"
    );

    let body = format!(
        r#"      <p>Hi <strong>{user}</strong>,</p>
      <div class="notice" style="background: #eff6ff; border: 1px solid #bfdbfe;">
        <p>You have not completed your daily check-in for <strong>{date}</strong> yet.</p>
      </div>
      <p>If you miss the whole day, your emergency contacts will be notified.</p>"#,
        user = escape(user_name),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text,
        html: Some(page("#3b82f6", "Check-in reminder", &body)),
    }
}

/// Message confirming that delivery works
pub fn test_email(to: &str) -> OutgoingEmail {
    let text = format!(
        "This is a test email from Daily Check-In.\n\n\
         If you can read this, email notifications are working.\n\n\
         ---\n{FOOTER}"
    );

    let body = "      <p>This is a test email from Daily Check-In.</p>\n      \
                <p>If you can read this, email notifications are working.</p>";

    OutgoingEmail {
        to: to.to_string(),
        subject: "[Test] Daily Check-In email".to_string(),
        text,
        html: Some(page("#10b981", "Test email", body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
    }

    #[test]
    fn test_missed_alert_names_user_and_date() {
        let email = missed_check_in_alert("mum@example.com", "Mum", "alice", date());

        assert_eq!(email.to, "mum@example.com");
        assert!(email.subject.contains("alice"));
        assert!(email.text.contains("Dear Mum"));
        assert!(email.text.contains("2024-01-14"));
        assert!(email.html.as_deref().unwrap().contains("2024-01-14"));
    }

    #[test]
    fn test_html_values_are_escaped() {
        let email = missed_check_in_alert("x@example.com", "<b>Eve</b>", "a&b", date());
        let html = email.html.unwrap();

        assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(!html.contains("<b>Eve</b>"));
    }

    #[test]
    fn test_reminder_mentions_today() {
        let email = check_in_reminder("alice@example.com", "alice", date());

        assert!(email.subject.contains("not checked in"));
        assert!(email.text.contains("Hi alice"));
        assert!(email.text.contains("2024-01-14"));
    }

    #[test]
    fn test_test_email_has_html_alternative() {
        let email = test_email("me@example.com");
        assert_eq!(email.to, "me@example.com");
        assert!(email.html.is_some());
    }
}
