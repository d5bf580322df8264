//! HTML bodies for the transactional emails.
use ogw_common::Cents;
use ogw_engine::{db_types::Order, NotificationError, NotificationType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Escapes text for interpolation into HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `R$ 1.234,56`
pub fn format_brl(amount: Cents) -> String {
    let value = amount.value();
    let sign = if value < 0 { "-" } else { "" };
    let value = value.unsigned_abs();
    let reais = (value / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{sign}R$ {grouped},{:02}", value % 100)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: Helvetica, Arial, sans-serif; color: #222; background: #f6f3ee; margin: 0; padding: 24px;">
<div style="max-width: 560px; margin: 0 auto; background: #fff; border-radius: 8px; padding: 32px;">
<h1 style="font-size: 20px; color: #8a4b2a; margin-top: 0;">{title}</h1>
{body}
<p style="font-size: 12px; color: #888; margin-top: 32px;">Este é um email automático. Em caso de dúvidas, responda a esta mensagem.</p>
</div>
</body>
</html>"#
    )
}

fn confirmation(order: &Order) -> RenderedEmail {
    let name = escape_html(&order.customer.name);
    let rows = order
        .items
        .iter()
        .map(|i| {
            format!(
                r#"<tr><td>{}</td><td style="text-align: center;">{}</td><td style="text-align: right;">{}</td></tr>"#,
                escape_html(&i.title),
                i.quantity,
                format_brl(i.subtotal())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let shipping = &order.shipping.0;
    let payment_id = order.gateway_payment_id.as_deref().map(escape_html).unwrap_or_else(|| "-".to_string());
    let body = format!(
        r#"<p>Olá, {name}! Recebemos o pagamento do seu pedido <strong>#{id}</strong> e ele já está em produção.</p>
<table style="width: 100%; border-collapse: collapse;">
<tr><th style="text-align: left;">Item</th><th>Qtd.</th><th style="text-align: right;">Subtotal</th></tr>
{rows}
<tr><td colspan="2">Frete ({shipping_name})</td><td style="text-align: right;">{shipping_price}</td></tr>
<tr><td colspan="2"><strong>Total</strong></td><td style="text-align: right;"><strong>{total}</strong></td></tr>
</table>
<p><strong>Endereço de entrega:</strong><br>{address}</p>
<p style="font-size: 12px; color: #888;">Pagamento {payment_id}</p>"#,
        id = order.id.value(),
        shipping_name = escape_html(&shipping.name),
        shipping_price = format_brl(shipping.price),
        total = format_brl(order.total_price),
        address = escape_html(&order.address.to_string()),
    );
    let subject = format!("Pedido #{} confirmado", order.id.value());
    RenderedEmail { html: layout(&subject, &body), subject }
}

fn tracking(order: &Order) -> Result<RenderedEmail, NotificationError> {
    let code = order.tracking_code.as_deref().ok_or_else(|| {
        NotificationError::Template(NotificationType::Tracking, format!("order {} has no tracking code", order.id))
    })?;
    let body = format!(
        r#"<p>Olá, {name}! Seu pedido <strong>#{id}</strong> foi enviado.</p>
<p>Código de rastreio: <strong style="font-size: 18px;">{code}</strong></p>"#,
        name = escape_html(&order.customer.name),
        id = order.id.value(),
        code = escape_html(code),
    );
    let subject = format!("Pedido #{} enviado", order.id.value());
    Ok(RenderedEmail { html: layout(&subject, &body), subject })
}

fn expiry(order: &Order) -> RenderedEmail {
    let body = format!(
        r#"<p>Olá, {name}! O prazo para pagamento do pedido <strong>#{id}</strong> terminou e ele foi cancelado.</p>
<p>Se ainda quiser os produtos, é só fazer um novo pedido na loja.</p>"#,
        name = escape_html(&order.customer.name),
        id = order.id.value(),
    );
    let subject = format!("Pedido #{} cancelado", order.id.value());
    RenderedEmail { html: layout(&subject, &body), subject }
}

pub fn render(order: &Order, kind: NotificationType) -> Result<RenderedEmail, NotificationError> {
    match kind {
        NotificationType::Confirmation => Ok(confirmation(order)),
        NotificationType::Tracking => tracking(order),
        NotificationType::Expiry => Ok(expiry(order)),
    }
}
