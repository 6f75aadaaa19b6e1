/// Transactional email templates
///
/// HTML builders for the two system emails: the order confirmation sent
/// after a verified checkout and the company invite. Inline styles only,
/// so the markup survives the stripping most mail clients do. Interpolated
/// values are HTML-escaped before insertion.
use chrono::{Datelike, Utc};

/// Escapes a value for interpolation into HTML text or attributes.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Formats a rupee amount with Indian digit grouping, e.g. `₹1,23,456`.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 2 + 4);
    if amount < 0 {
        formatted.push('-');
    }
    formatted.push('₹');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 {
            let remaining = digits.len() - i;
            // Indian grouping: rightmost group of three, then groups of two
            if remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0) {
                formatted.push(',');
            }
        }
        formatted.push(ch);
    }
    formatted
}

/// Subject line for the order confirmation email.
pub fn order_confirmation_subject(order_id: &str) -> String {
    format!("Your Order is Confirmed (#{order_id})")
}

/// Renders the order confirmation email body.
///
/// A blank `customer_name` falls back to a generic greeting. Each entry in
/// `additional_products` is shown as an add-on line under the main item.
pub fn order_confirmation_html(
    customer_name: &str,
    order_id: &str,
    amount: i64,
    additional_products: &[String],
) -> String {
    let greeting_name = if customer_name.trim().is_empty() {
        "there".to_string()
    } else {
        escape_html(customer_name)
    };
    let order_id = escape_html(order_id);
    let price = format_inr(amount);
    let year = Utc::now().year();

    let addon_rows: String = additional_products
        .iter()
        .map(|product| {
            format!(
                "<tr>\
                 <td style=\"padding:6px 0;color:#444;\">{} \
                 <span style=\"font-size:12px;color:#777;\">(Add-on)</span></td>\
                 <td style=\"padding:6px 0;text-align:right;color:#444;\"></td>\
                 </tr>",
                escape_html(product)
            )
        })
        .collect();

    format!(
        "<!doctype html>\
         <html><head>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\
         <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\"/>\
         <title>Order Confirmation - TaskHive</title>\
         </head>\
         <body style=\"margin:0;padding:0;background:#f5f7fa;font-family:Inter,Segoe UI,Roboto,Arial,sans-serif;\">\
         <table role=\"presentation\" width=\"100%\" cellspacing=\"0\" cellpadding=\"0\" style=\"background:#f5f7fa;padding:24px 0;\">\
         <tr><td align=\"center\">\
         <table role=\"presentation\" width=\"600\" cellspacing=\"0\" cellpadding=\"0\" style=\"background:#fff;border-radius:12px;overflow:hidden;\">\
         <tr><td style=\"padding:20px 28px;background:#1f2937;color:#fff;text-align:center;\">\
         <h1 style=\"margin:0;font-size:20px;font-weight:700;\">TaskHive</h1>\
         <p style=\"margin:4px 0 0;font-size:12px;opacity:0.9;\">Order Confirmation</p>\
         </td></tr>\
         <tr><td style=\"padding:28px;\">\
         <p style=\"margin:0 0 12px;color:#111;font-size:16px;\">Hi {greeting_name},</p>\
         <p style=\"margin:0 0 16px;color:#333;line-height:1.6;\">Thank you for your purchase! Your payment was successful and your order is confirmed.</p>\
         <div style=\"margin:18px 0;padding:12px 14px;background:#f3f4f6;border-radius:10px;\">\
         <p style=\"margin:0;color:#111;\"><strong>Order ID:</strong> {order_id}</p>\
         <p style=\"margin:4px 0 0;color:#111;\"><strong>Amount Paid:</strong> {price}</p>\
         </div>\
         <table role=\"presentation\" width=\"100%\" cellspacing=\"0\" cellpadding=\"0\" style=\"margin-top:8px;\">\
         <tr>\
         <th align=\"left\" style=\"padding:8px 0;border-bottom:1px solid #d1d5db;color:#111;\">Item</th>\
         <th align=\"right\" style=\"padding:8px 0;border-bottom:1px solid #d1d5db;color:#111;\">Price</th>\
         </tr>\
         <tr>\
         <td style=\"padding:8px 0;color:#111;\">Your order</td>\
         <td style=\"padding:8px 0;text-align:right;color:#111;\">{price}</td>\
         </tr>\
         {addon_rows}\
         <tr>\
         <td style=\"padding:12px 0;border-top:1px dashed #d1d5db;color:#111;\"><strong>Total</strong></td>\
         <td style=\"padding:12px 0;border-top:1px dashed #d1d5db;text-align:right;color:#111;\"><strong>{price}</strong></td>\
         </tr>\
         </table>\
         <p style=\"margin:18px 0 0;color:#333;line-height:1.6;\">Your order is being processed and you will receive updates by email.</p>\
         <p style=\"margin:24px 0 0;color:#111;\">With thanks,<br/>The TaskHive Team</p>\
         </td></tr>\
         <tr><td style=\"padding:16px 28px;background:#1f2937;color:#d1d5db;font-size:12px;\">&copy; {year} TaskHive. All rights reserved.</td></tr>\
         </table>\
         <p style=\"color:#9aa0a6;font-size:12px;margin:14px 0 0;\">This is an automated message from TaskHive.</p>\
         </td></tr>\
         </table>\
         </body></html>"
    )
}

/// Subject line for the company invite email.
pub fn invite_subject(company_name: &str) -> String {
    format!("You're invited to join {company_name}")
}

/// Renders the company invite email body.
pub fn invite_html(recipient_name: &str, company_name: &str, accept_link: &str) -> String {
    let greeting_name = if recipient_name.trim().is_empty() {
        "there".to_string()
    } else {
        escape_html(recipient_name)
    };
    let company_name = escape_html(company_name);
    let accept_link = escape_html(accept_link);
    let year = Utc::now().year();

    format!(
        "<!doctype html>\
         <html lang=\"en\"><head>\
         <meta charset=\"UTF-8\"/>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\
         <title>You're Invited</title>\
         </head>\
         <body style=\"margin:0;padding:0;background:#f5f5f5;font-family:Arial,sans-serif;\">\
         <div style=\"max-width:600px;margin:30px auto;background:#ffffff;padding:20px;border-radius:8px;\">\
         <div style=\"text-align:center;padding-bottom:20px;border-bottom:1px solid #eeeeee;\">\
         <h1 style=\"margin:0;color:#333333;\">You're Invited!</h1>\
         </div>\
         <div style=\"padding:20px 0;color:#555555;line-height:1.6;\">\
         <p>Hello {greeting_name},</p>\
         <p>You have been invited to join <strong>{company_name}</strong> on TaskHive.</p>\
         <p>Click the button below to accept the invitation and get started:</p>\
         <a href=\"{accept_link}\" style=\"display:inline-block;background-color:#4CAF50;color:#ffffff;text-decoration:none;padding:12px 20px;border-radius:5px;margin-top:20px;font-weight:bold;\">Accept Invite</a>\
         <p>If the button does not work, copy and paste this link into your browser:</p>\
         <p><a href=\"{accept_link}\">{accept_link}</a></p>\
         <p>Welcome aboard!</p>\
         </div>\
         <div style=\"font-size:12px;color:#999999;text-align:center;margin-top:30px;\">\
         &copy; {year} TaskHive. All rights reserved.\
         </div>\
         </div>\
         </body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1_000), "₹1,000");
        assert_eq!(format_inr(123_456), "₹1,23,456");
        assert_eq!(format_inr(12_345_678), "₹1,23,45,678");
    }

    #[test]
    fn test_order_confirmation_contains_details() {
        let html = order_confirmation_html(
            "Jordan Lee",
            "order_1718000000000",
            12_999,
            &["Gift wrap".to_string()],
        );

        assert!(html.contains("Hi Jordan Lee,"));
        assert!(html.contains("order_1718000000000"));
        assert!(html.contains("₹12,999"));
        assert!(html.contains("Gift wrap"));
        assert!(html.contains("(Add-on)"));
    }

    #[test]
    fn test_order_confirmation_blank_name_falls_back() {
        let html = order_confirmation_html("  ", "order_1", 500, &[]);
        assert!(html.contains("Hi there,"));
    }

    #[test]
    fn test_order_confirmation_subject() {
        assert_eq!(
            order_confirmation_subject("order_42"),
            "Your Order is Confirmed (#order_42)"
        );
    }

    #[test]
    fn test_invite_contains_link_and_company() {
        let html = invite_html("Sam", "Acme Corp", "https://app.taskhive.dev/invites/tok123");

        assert!(html.contains("Hello Sam,"));
        assert!(html.contains("<strong>Acme Corp</strong>"));
        assert!(html.contains("https://app.taskhive.dev/invites/tok123"));
    }

    #[test]
    fn test_html_is_escaped() {
        let html = invite_html("<script>", "A&B Studios", "https://example.com/a?b=1&c=2");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A&amp;B Studios"));
    }
}
