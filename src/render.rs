use ethabi::Token;

use crate::event::{Event, EventState};

/// Seam between the feed and whatever presents it. The feed hands over the
/// combined list (pending rows first) after every applied batch; renderers
/// must not reorder it.
pub trait Render {
    fn render(&self, events: &[Event]);
}

/// Renders each event as one info-level log line. This is the only renderer
/// the daemon ships; richer widgets plug in through the trait.
pub struct LineRender;

impl Render for LineRender {
    fn render(&self, events: &[Event]) {
        for event in events {
            info!("{}", row(event));
        }
    }
}

/// One display row. Known sale events get a dedicated layout, anything else
/// falls back to dumping the decoded parameters in name order.
pub fn row(event: &Event) -> String {
    let position = match event.state {
        EventState::Mined => format!("mined #{}/{}", event.block_number, event.log_index),
        EventState::Pending => "pending".to_string(),
    };
    let body = match event.name.as_str() {
        "Buyin" => format!(
            "Buyin who={} accounted={} received={} price={}",
            param(event, "who"),
            param(event, "accounted"),
            param(event, "received"),
            param(event, "price"),
        ),
        "NewTranch" => format!("NewTranch price={}", param(event, "price")),
        "Refund" => format!(
            "Refund who={} amount={}",
            param(event, "who"),
            param(event, "amount"),
        ),
        "Transfer" => format!(
            "Transfer from={} to={} value={}",
            param(event, "from"),
            param(event, "to"),
            param(event, "value"),
        ),
        name => {
            let params = event
                .params
                .iter()
                .map(|(name, token)| format!("{}={}", name, token_text(token)))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{} {}", name, params)
        }
    };
    format!("[{}] {} tx=0x{:x} key=0x{:x}", position, body, event.transaction_hash, event.key)
}

fn param(event: &Event, name: &str) -> String {
    event
        .params
        .get(name)
        .map(token_text)
        .unwrap_or_else(|| "?".to_string())
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Address(address) => format!("0x{:x}", address),
        Token::Uint(value) | Token::Int(value) => value.to_string(),
        Token::Bool(value) => value.to_string(),
        Token::String(value) => value.clone(),
        other => format!("{:?}", other),
    }
}
