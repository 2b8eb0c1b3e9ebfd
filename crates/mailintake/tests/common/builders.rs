//! Builders for raw RFC 5322 test messages.

#![allow(dead_code)]

use mailintake::email::InboundMessage;

const BOUNDARY: &str = "mailintake-test-boundary";

struct Attachment {
    filename: Option<String>,
    content_type: String,
    content: Vec<u8>,
}

/// Builder for raw messages. Attachment bodies are sent as-is (7bit), so
/// test content should be plain ASCII.
pub struct MessageBuilder {
    uid: String,
    from: String,
    subject: String,
    date: Option<String>,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn new(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            from: "Jane Doe <jane@example.com>".to_string(),
            subject: format!("Application {}", uid),
            date: Some("Mon, 5 Jan 2026 09:30:00 +0000".to_string()),
            text: Some("Hello, please consider my application.".to_string()),
            html: None,
            attachments: Vec::new(),
        }
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn without_date(mut self) -> Self {
        self.date = None;
        self
    }

    /// Replaces the plain-text body with an HTML body.
    pub fn html(mut self, html: &str) -> Self {
        self.text = None;
        self.html = Some(html.to_string());
        self
    }

    pub fn attachment(mut self, filename: &str, content_type: &str, content: &[u8]) -> Self {
        self.attachments.push(Attachment {
            filename: Some(filename.to_string()),
            content_type: content_type.to_string(),
            content: content.to_vec(),
        });
        self
    }

    pub fn unnamed_attachment(mut self, content_type: &str, content: &[u8]) -> Self {
        self.attachments.push(Attachment {
            filename: None,
            content_type: content_type.to_string(),
            content: content.to_vec(),
        });
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn build_raw(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_line(&mut out, &format!("From: {}", self.from));
        push_line(&mut out, "To: hr@example.com");
        push_line(&mut out, &format!("Subject: {}", self.subject));
        if let Some(date) = &self.date {
            push_line(&mut out, &format!("Date: {}", date));
        }
        push_line(&mut out, "MIME-Version: 1.0");

        if self.attachments.is_empty() {
            match &self.html {
                Some(html) => {
                    push_line(&mut out, "Content-Type: text/html; charset=utf-8");
                    push_line(&mut out, "");
                    push_line(&mut out, html);
                }
                None => {
                    push_line(&mut out, "Content-Type: text/plain; charset=utf-8");
                    push_line(&mut out, "");
                    push_line(&mut out, self.text.as_deref().unwrap_or(""));
                }
            }
            return out;
        }

        push_line(
            &mut out,
            &format!("Content-Type: multipart/mixed; boundary=\"{}\"", BOUNDARY),
        );
        push_line(&mut out, "");

        push_line(&mut out, &format!("--{}", BOUNDARY));
        match &self.html {
            Some(html) => {
                push_line(&mut out, "Content-Type: text/html; charset=utf-8");
                push_line(&mut out, "");
                push_line(&mut out, html);
            }
            None => {
                push_line(&mut out, "Content-Type: text/plain; charset=utf-8");
                push_line(&mut out, "");
                push_line(&mut out, self.text.as_deref().unwrap_or(""));
            }
        }

        for attachment in &self.attachments {
            push_line(&mut out, &format!("--{}", BOUNDARY));
            match &attachment.filename {
                Some(name) => {
                    push_line(
                        &mut out,
                        &format!("Content-Type: {}; name=\"{}\"", attachment.content_type, name),
                    );
                    push_line(
                        &mut out,
                        &format!("Content-Disposition: attachment; filename=\"{}\"", name),
                    );
                }
                None => {
                    push_line(&mut out, &format!("Content-Type: {}", attachment.content_type));
                    push_line(&mut out, "Content-Disposition: attachment");
                }
            }
            push_line(&mut out, "");
            out.extend_from_slice(&attachment.content);
            out.extend_from_slice(b"\r\n");
        }
        push_line(&mut out, &format!("--{}--", BOUNDARY));
        out
    }

    pub fn build(&self) -> InboundMessage {
        InboundMessage::parse(self.uid.clone(), self.build_raw())
            .expect("test message should parse")
    }
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// HTML body with one `<a href>` per link.
pub fn html_with_links(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!("<a href=\"{}\">Download attachment</a><br>", link))
        .collect();
    format!("<html><body><p>My CV is too large to attach.</p>{}</body></html>", anchors)
}
