//! Sample invoice fixtures, used by `platen example` and the test suite.

use serde_json::{json, Value};

use crate::model::{Element, ElementKind, FontWeight, Page, TextAlign, Template};

/// A three-line invoice with company and customer details.
pub fn sample_data() -> Value {
    json!({
        "invoice": {
            "number": "INV-2024-001",
            "date": "2024-01-15",
            "dueDate": "2024-02-15",
            "customer": {
                "name": "Acme Corporation",
                "email": "billing@acme.com",
                "address": "123 Business St, Suite 100",
                "city": "San Francisco",
                "state": "CA",
                "zip": "94102"
            },
            "items": [
                {
                    "item": "Web Design Services",
                    "description": "Homepage and landing page design",
                    "quantity": 1,
                    "price": 2500,
                    "total": 2500
                },
                {
                    "item": "Development Hours",
                    "description": "Frontend development",
                    "quantity": 40,
                    "price": 150,
                    "total": 6000
                },
                {
                    "item": "Hosting Setup",
                    "description": "Annual hosting and domain",
                    "quantity": 1,
                    "price": 500,
                    "total": 500
                }
            ],
            "subtotal": 9000,
            "tax": 720,
            "total": 9720,
            "notes": "Payment due within 30 days. Thank you for your business!"
        },
        "company": {
            "name": "Your Company Name",
            "email": "hello@yourcompany.com",
            "phone": "(555) 123-4567",
            "address": "456 Company Blvd",
            "city": "New York",
            "state": "NY",
            "zip": "10001",
            "website": "www.yourcompany.com"
        }
    })
}

fn styled(mut element: Element, font_size: f64, weight: FontWeight, align: TextAlign) -> Element {
    if let ElementKind::Text(text) = &mut element.kind {
        text.font_size = font_size;
        text.font_weight = weight;
        text.align = align;
    }
    element
}

/// An A4 invoice layout bound to [`sample_data`].
pub fn sample_template() -> Template {
    use FontWeight::{Bold, Normal};
    use TextAlign::{Left, Right};

    let elements = vec![
        styled(
            Element::text("company-name", 40.0, 40.0, 360.0, 40.0, "Company").with_binding("company.name"),
            24.0,
            Bold,
            Left,
        ),
        styled(Element::text("title", 554.0, 40.0, 200.0, 40.0, "INVOICE"), 24.0, Bold, Right),
        styled(
            Element::text("company-email", 40.0, 84.0, 360.0, 24.0, "Email").with_binding("company.email"),
            12.0,
            Normal,
            Left,
        ),
        styled(
            Element::text("invoice-number", 554.0, 86.0, 200.0, 24.0, "Number").with_binding("invoice.number"),
            12.0,
            Normal,
            Right,
        ),
        Element::line("header-rule", 40.0, 130.0, 714.0, 2.0),
        styled(Element::text("bill-to", 40.0, 150.0, 200.0, 24.0, "Bill to"), 12.0, Bold, Left),
        styled(
            Element::text("invoice-date", 554.0, 152.0, 200.0, 24.0, "Date").with_binding("invoice.date"),
            12.0,
            Normal,
            Right,
        ),
        styled(
            Element::text("customer-name", 40.0, 180.0, 360.0, 24.0, "Customer").with_binding("invoice.customer.name"),
            14.0,
            Normal,
            Left,
        ),
        styled(
            Element::text("due-date", 554.0, 182.0, 200.0, 24.0, "Due").with_binding("invoice.dueDate"),
            12.0,
            Normal,
            Right,
        ),
        Element::table(
            "items",
            40.0,
            230.0,
            714.0,
            120.0,
            &["Item", "Quantity", "Price", "Total"],
            Some("invoice.items"),
        )
        .with_min_height(120.0),
        styled(
            Element::text("subtotal", 554.0, 370.0, 200.0, 24.0, "Subtotal").with_binding("invoice.subtotal"),
            12.0,
            Normal,
            Right,
        ),
        styled(
            Element::text("tax", 554.0, 400.0, 200.0, 24.0, "Tax").with_binding("invoice.tax"),
            12.0,
            Normal,
            Right,
        ),
        styled(
            Element::text("total", 554.0, 430.0, 200.0, 32.0, "Total").with_binding("invoice.total"),
            16.0,
            Bold,
            Right,
        ),
        styled(
            Element::text("notes", 40.0, 490.0, 714.0, 24.0, "Notes").with_binding("invoice.notes"),
            11.0,
            Normal,
            Left,
        ),
    ];

    Template {
        id: "sample-invoice".to_string(),
        name: "Sample Invoice".to_string(),
        version: 1,
        page: Page::default(),
        elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::unresolved_bindings;
    use crate::layout::collision::overlapping_pairs;

    #[test]
    fn test_sample_template_is_clean() {
        let template = sample_template();
        assert!(overlapping_pairs(&template.elements).is_empty());
        assert!(unresolved_bindings(&template.elements, &sample_data()).is_empty());
        assert!(template.page.validate().is_ok());
    }

    #[test]
    fn test_sample_template_round_trips_through_json() {
        let template = sample_template();
        let json = serde_json::to_string(&template).unwrap();
        assert_eq!(Template::from_json(&json).unwrap(), template);
    }
}
