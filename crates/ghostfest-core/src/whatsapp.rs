//! WhatsApp click-to-chat links.
//!
//! Nothing is sent from the server. Staff open the returned link, which
//! pre-fills a message to the registrant or to the owner.

use crate::models::Submission;
use crate::phone::whatsapp_number;

/// `https://wa.me/<number>?text=<message>` with the message URL-encoded.
pub fn wa_link(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        whatsapp_number(number),
        urlencoding::encode(message)
    )
}

/// Payment reminder sent to the registrant.
pub fn reminder_message(submission: &Submission, base_url: &str) -> String {
    let check_link = format!("{}/check", base_url.trim_end_matches('/'));
    format!(
        "您好。Hi. 👋🏻\n\
         请尽快结清。Kindly settle your payment as soon as possible.\n\
         To check your payment status and amount, please visit the link below:\n\
         👉🏻 {check_link}\n\
         Please enter your Order ID: {}\n\
         谢谢! Thank you! ☺️🙏",
        submission.order_id
    )
}

/// Request for the owner to delete a record.
pub fn delete_approval_message(admin: &str, submission: &Submission) -> String {
    format!(
        "Admin {admin} requests to DELETE submission:\n\
         Order ID: {}, Name: {}\n\
         Please approve or reject in the admin dashboard.",
        submission.order_id, submission.name_cn
    )
}

/// Request for the owner to pause or resume intake.
pub fn pause_approval_message(admin: &str) -> String {
    format!(
        "Admin {admin} requests to pause/resume submissions.\n\
         Please review and approve in the admin dashboard."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoatChoice, PaymentMethod};

    fn submission() -> Submission {
        Submission {
            id: 3,
            order_id: "6789".into(),
            date: crate::config::local_now(),
            boat: BoatChoice::No,
            gender: "male".into(),
            name_cn: "陈大文".into(),
            name_en: "Tan".into(),
            phone: "+60 123456789".into(),
            payment_method: PaymentMethod::Tng,
            count: 1,
            total: 38,
            paid: false,
            entries: vec![],
            payment_amount: 0,
            remarks: String::new(),
        }
    }

    #[test]
    fn test_wa_link_encodes_text() {
        let link = wa_link("+60 12 345", "hi there\nOK");
        assert_eq!(link, "https://wa.me/6012345?text=hi%20there%0AOK");
    }

    #[test]
    fn test_reminder_contains_check_link_and_order() {
        let msg = reminder_message(&submission(), "https://fest.example/");
        assert!(msg.contains("👉🏻 https://fest.example/check\n"));
        assert!(msg.contains("Please enter your Order ID: 6789"));
    }

    #[test]
    fn test_approval_messages() {
        let msg = delete_approval_message("Lily", &submission());
        assert!(msg.starts_with("Admin Lily requests to DELETE submission:"));
        assert!(msg.contains("Order ID: 6789, Name: 陈大文"));

        let msg = pause_approval_message("Lily");
        assert!(msg.contains("pause/resume"));
    }
}
