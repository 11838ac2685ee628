//! Localized user-facing strings (English and Arabic)

use super::models::Language;

pub fn new_chat_title(lang: Language) -> &'static str {
    match lang {
        Language::En => "New Chat",
        Language::Ar => "محادثة جديدة",
    }
}

pub fn file_attached_label(lang: Language, filename: &str) -> String {
    match lang {
        Language::En => format!("[File attached]: {}", filename),
        Language::Ar => format!("[ملف مرفق]: {}", filename),
    }
}

pub fn file_uploaded(lang: Language) -> &'static str {
    match lang {
        Language::En => "File uploaded.",
        Language::Ar => "تم رفع ملف.",
    }
}

/// Inline message for a failed request; `detail` is the server's reason
pub fn request_failed(lang: Language, detail: Option<&str>) -> String {
    match lang {
        Language::En => format!(
            "Sorry, an error occurred: {}",
            detail.unwrap_or("Failed to get response")
        ),
        Language::Ar => format!(
            "عذراً، حدث خطأ: {}",
            detail.unwrap_or("فشل في الحصول على الرد")
        ),
    }
}

pub fn connection_error(lang: Language) -> &'static str {
    match lang {
        Language::En => "Sorry, connection error. Please try again.",
        Language::Ar => "عذراً، حدث خطأ في الاتصال. يرجى المحاولة مرة أخرى.",
    }
}

pub fn file_too_large(lang: Language) -> &'static str {
    match lang {
        Language::En => "File size too large. Maximum 10MB allowed.",
        Language::Ar => "حجم الملف كبير جداً. الحد الأقصى 10 ميجابايت.",
    }
}

pub fn file_type_not_supported(lang: Language) -> &'static str {
    match lang {
        Language::En => {
            "File type not supported. Please select PDF, Word, Excel, PowerPoint, text, or image files."
        }
        Language::Ar => {
            "نوع الملف غير مدعوم. يرجى اختيار PDF، Word، Excel، PowerPoint، نص، أو صورة."
        }
    }
}

pub fn delete_failed(lang: Language) -> &'static str {
    match lang {
        Language::En => "Unable to delete the chat.",
        Language::Ar => "تعذر حذف المحادثة.",
    }
}

/// Starter questions offered on an empty conversation
pub fn suggested_questions(lang: Language) -> [&'static str; 4] {
    match lang {
        Language::En => [
            "What is the minimum credit score required for a loan?",
            "What are the interest rates for business loans?",
            "What types of business loans are available?",
            "What documents are required for a home loan?",
        ],
        Language::Ar => [
            "ما هو الحد الأدنى لدرجة الائتمان المطلوبة للحصول على قرض؟",
            "ما هي أسعار الفائدة للقروض التجارية؟",
            "ما هي أنواع القروض التجارية المتاحة؟",
            "ما هي المستندات المطلوبة للحصول على قرض سكني؟",
        ],
    }
}

// The summary panel only shows English fallbacks.
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary at this time. Please try again.";
pub const SUMMARY_ERROR: &str = "Error generating summary. Please try again.";
