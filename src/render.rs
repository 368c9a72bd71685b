//! HTML rendering of the board page
use crate::auction::{self, Amount, Bid, MAX_USERNAME_LEN};
use crate::board::BoardView;
use std::fmt::Write;

pub const CURRENCY: &str = "R$";
pub const PAGE_TITLE: &str = "Auction: lojas CPB!";
pub const CONTACT: &str = "lojascpb@gmail.com";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Success => "notice success",
            NoticeLevel::Warning => "notice warning",
            NoticeLevel::Error => "notice error",
        }
    }
}

/// Outcome of the action that produced this page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub fn format_amount(amount: Amount) -> String {
    format!("{CURRENCY} {amount:.2}")
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ccc;padding:.3rem .6rem;text-align:left}\
.notice{padding:.6rem;border-radius:.3rem}.success{background:#e6f4ea}.warning{background:#fff4e5}\
.error{background:#fdecea}.info{background:#e8f0fe;padding:.6rem}.caption{color:#666;font-size:.85rem}";

/// The whole page; `db_path` goes into the footer
pub fn page(view: &BoardView, notice: Option<&Notice>, db_path: &str) -> String {
    let mut html = String::new();

    // writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>\n<h1>{title}</h1>\n\
         <p>Enter your name and bid amount. The board shows which bid is in the lead.</p>\n\
         <p>{contact}</p>\n",
        title = escape(PAGE_TITLE),
        contact = escape(CONTACT),
    );

    html.push_str(&bid_form());
    if let Some(notice) = notice {
        html.push_str(&notice_html(notice));
    }
    html.push_str(&leader_panel(view.leader.as_ref()));
    html.push_str("<hr>\n");
    html.push_str(&history_table(&view.history));
    html.push_str(&admin_panel());

    let _ = write!(
        html,
        "<hr>\n<p class=\"caption\">Database file: {}</p>\n</body></html>\n",
        escape(db_path)
    );

    html
}

fn bid_form() -> String {
    format!(
        "<form method=\"post\" action=\"/bid\">\n\
         <label>Username <input type=\"text\" name=\"username\" maxlength=\"{MAX_USERNAME_LEN}\" required></label>\n\
         <label>Bid amount ({CURRENCY}) <input type=\"number\" name=\"amount\" min=\"0\" step=\"0.01\" value=\"0.00\"></label>\n\
         <button type=\"submit\">Place bid</button>\n\
         </form>\n"
    )
}

pub fn notice_html(notice: &Notice) -> String {
    format!(
        "<p class=\"{}\">{}</p>\n",
        notice.level.css_class(),
        escape(&notice.message)
    )
}

pub fn leader_panel(leader: Option<&Bid>) -> String {
    match leader {
        Some(bid) => format!(
            "<h3>Leading bid</h3>\n<p id=\"leader\"><strong>{}</strong> &mdash; {}</p>\n\
             <p class=\"caption\">Placed at (UTC): {}</p>\n",
            escape(&bid.username),
            format_amount(bid.amount),
            auction::format_timestamp(&bid.timestamp),
        ),
        None => "<h3>Leading bid</h3>\n<p id=\"leader\" class=\"info\">No bids yet. Be the first!</p>\n"
            .to_owned(),
    }
}

pub fn history_table(history: &[Bid]) -> String {
    let mut html = String::from("<h3>Bid history</h3>\n");

    if history.is_empty() {
        html.push_str("<p id=\"history\">No bids recorded.</p>\n");
        return html;
    }

    html.push_str(
        "<table id=\"history\">\n<tr><th>id</th><th>username</th><th>amount</th><th>timestamp</th></tr>\n",
    );
    for bid in history {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            bid.id,
            escape(&bid.username),
            format_amount(bid.amount),
            auction::format_timestamp(&bid.timestamp),
        );
    }
    html.push_str("</table>\n");
    html
}

fn admin_panel() -> String {
    "<details>\n<summary>Admin &mdash; quick actions</summary>\n\
     <p>Admin actions require the password.</p>\n\
     <form method=\"post\">\n\
     <label>Admin password <input type=\"password\" name=\"password\"></label>\n\
     <button type=\"submit\" formaction=\"/admin/clear\">Clear all bids</button>\n\
     <button type=\"submit\" formaction=\"/admin/reset\">Reset database (recreate table)</button>\n\
     </form>\n</details>\n"
        .to_owned()
}

/// Shown when the board itself can't be read
///
/// `notice` is the outcome of the action that ran before the read failed;
/// that action may well have gone through.
pub fn failure_page(notice: Option<&Notice>, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\n\
         <h1>{title}</h1>\n{notice}<p class=\"notice error\">{}</p>\n<p><a href=\"/\">Try again</a></p>\n</body></html>\n",
        escape(message),
        title = escape(PAGE_TITLE),
        notice = notice.map(notice_html).unwrap_or_default(),
    )
}
