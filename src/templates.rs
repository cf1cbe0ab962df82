//! Sample Arabic fragments used by the unit tests.
//!
//! Each fragment exercises different supported elements and styles.

/// Report with headings, justified paragraphs and a table.
pub fn report_template() -> &'static str {
    r##"
<div class="arabic-title">التقرير السنوي ٢٠٢٤</div>
<div class="arabic-subtitle">ملخص الأداء</div>
<div class="arabic-paragraph">حققت الشركة خلال هذا العام نموا ملحوظا في جميع القطاعات، وارتفعت المبيعات بنسبة
خمسة عشر بالمئة مقارنة بالعام الماضي.</div>
<div class="arabic-paragraph">كما تم افتتاح ثلاثة فروع جديدة في الرياض وجدة والدمام.</div>

<table style="width: 100%">
    <tr>
        <th style="padding: 4px; background-color: #eeeeee">القطاع</th>
        <th style="padding: 4px; background-color: #eeeeee">الإيرادات</th>
    </tr>
    <tr>
        <td style="padding: 4px">التجزئة</td>
        <td style="padding: 4px">١٢٠٬٠٠٠</td>
    </tr>
    <tr>
        <td style="padding: 4px">الجملة</td>
        <td style="padding: 4px">٨٥٬٠٠٠</td>
    </tr>
</table>
"##
}

/// Mixed Arabic and Latin text with inline formatting and a list.
pub fn mixed_template() -> &'static str {
    r##"
<div class="arabic-text">تم إنشاء هذا الملف باستخدام مكتبة <b>PDF</b> العربية<br>الإصدار 1.0</div>
<ul>
    <li>دعم الخطوط العربية</li>
    <li>اتجاه النص من اليمين إلى اليسار</li>
    <li>Mixed content: English inside Arabic</li>
</ul>
<p dir="ltr" style="text-align: left">Left-to-right paragraph inside an RTL document.</p>
"##
}

/// Long document that must spread over several pages.
pub fn long_template() -> String {
    (1..=60)
        .map(|i| format!("<div class=\"arabic-paragraph\">الفقرة رقم {i}: نص تجريبي لملء الصفحة وضمان انتقال المحتوى إلى صفحة جديدة.</div>\n"))
        .collect()
}

#[cfg(all(test, feature = "forge"))]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::PageSetup;
    use crate::fonts::FontRegistry;
    use crate::forge::{compute_layout_config, generate_pdf, FontManager, PipelineConfig};
    use crate::prepare::prepare_arabic_html;

    fn prepared(fragment: &str) -> String {
        prepare_arabic_html(fragment, &FontRegistry::from_dir(Path::new("/nonexistent")))
    }

    fn config() -> PipelineConfig {
        PipelineConfig::from_page_setup(&PageSetup::default(), "sample")
    }

    #[test]
    fn report_renders() {
        let (bytes, layout) =
            generate_pdf(&prepared(report_template()), &config(), &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn report_title_is_centered_rtl() {
        let layout =
            compute_layout_config(&prepared(report_template()), &config(), &FontManager::default())
                .unwrap();
        let title = layout.pages[0].boxes[0].text.as_ref().unwrap();
        assert!(title.rtl);
        assert!(title.bold);
        assert_eq!(title.text_align, "center");
        assert_eq!(title.font_size, 18.0);
    }

    #[test]
    fn mixed_renders() {
        let (bytes, _) =
            generate_pdf(&prepared(mixed_template()), &config(), &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn long_document_paginates() {
        let layout =
            compute_layout_config(&prepared(&long_template()), &config(), &FontManager::default())
                .unwrap();
        assert!(layout.page_count() > 1, "got {} pages", layout.page_count());
    }
}
