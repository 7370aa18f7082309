use intake_core::domain::order::Order;

pub const PARSE_MODE: &str = "Markdown";

/// Renders the chat summary for an accepted order. Absent optional fields
/// are left out entirely.
pub fn render_order_summary(order: &Order) -> String {
    let submission = &order.submission;
    let mut lines = vec!["*New Order Received*".to_string(), String::new()];

    lines.push(field_line("Name", &submission.name));
    lines.push(field_line("Email", &submission.email));
    lines.push(field_line("Phone", &submission.phone));

    let optional_fields = [
        ("Contact Method", submission.contact_method.map(|method| method.as_str().to_string())),
        ("Country", submission.country.clone()),
        ("Username", submission.username.clone()),
        ("Verification", submission.verification_status.clone()),
        ("Selected Card", submission.selected_card.clone()),
        ("Message", submission.message.clone()),
    ];
    for (label, value) in optional_fields {
        if let Some(value) = value {
            lines.push(field_line(label, &value));
        }
    }

    lines.push(String::new());
    lines.push(field_line("Time", &order.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
    lines.push(field_line("Order ID", &order.id.to_string()));

    lines.join("\n")
}

fn field_line(label: &str, value: &str) -> String {
    format!("*{label}:* {}", escape_markdown(value))
}

/// Escapes the entity markers of Telegram's legacy Markdown so customer
/// text cannot break the message formatting.
pub fn escape_markdown(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
