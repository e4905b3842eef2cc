use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::models::{ProductData, dedup_preserving_order};
use crate::scrapers::traits::{AdapterContext, SiteAdapter};
use crate::utils::error::Result;
use crate::utils::html::{clean_text, is_tag, next_element_siblings, select_all, select_first, stripped_text, text_of};
use crate::utils::relaxed_json::{extract_balanced_array, parse_relaxed};

const COLOR_IMAGES_MARKER: &str = "'colorImages': { 'initial': ";
const PRICE_BLOCK: &str = "#corePriceDisplay_desktop_feature_div";
const STRUCK_PRICE: &str = r#".a-price.a-text-price[data-a-strike="true"] .a-offscreen"#;

static SIZE_SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(.*/)([^/.]+)(\..+)(\.[^.]+)$").ok());
static OFFSCREEN_PRICE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"S\$(\d+\.?\d*)").ok());

/// Marketplace pages: DOM fields plus an image catalog embedded in a
/// `<script>` object literal.
pub struct AmazonAdapter {
    ctx: AdapterContext,
}

impl AmazonAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl SiteAdapter for AmazonAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn parse_product_data(&self, html: &str, product_id: &str, url: &str) -> Result<ProductData> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let (price_current, price_original) = parse_price(root);
        let image_urls_original = parse_image_urls(root);
        let image_urls_simplified =
            dedup_preserving_order(image_urls_original.iter().map(|u| simplify_image_url(u)));

        let mut infos = Map::new();
        infos.insert("meta_info".into(), Value::Object(parse_meta_info(root)));
        infos.insert("about_this_item".into(), json!(parse_about_this_item(root)));
        infos.insert("product_description".into(), json!(parse_product_description(root)));
        infos.insert("product_infomation".into(), parse_product_information(root));
        infos.insert("product_details".into(), Value::Object(parse_product_details(root)));
        infos.insert(
            "important_information".into(),
            Value::Object(parse_important_information(root)),
        );

        let mut data = ProductData::new(product_id, url);
        data.product_name = parse_title(root).unwrap_or_default();
        data.brand = parse_brand(root).unwrap_or_default();
        data.price_current = price_current.unwrap_or_default();
        data.price_original = price_original.unwrap_or_default();
        data.image_urls_original = image_urls_original;
        data.image_urls_simplified = image_urls_simplified;
        data.infos = Value::Object(infos);
        Ok(data)
    }
}

/// `.../71abc._AC_SL1500_.jpg` becomes `.../71abc.jpg`.
pub fn simplify_image_url(url: &str) -> String {
    match SIZE_SEGMENT.as_ref() {
        Some(re) => re.replace(url, "${1}${2}${4}").into_owned(),
        None => url.to_string(),
    }
}

fn parse_title(root: ElementRef<'_>) -> Option<String> {
    select_first(root, "#productTitle").map(text_of)
}

fn parse_brand(root: ElementRef<'_>) -> Option<String> {
    let brand = text_of(select_first(root, "#bylineInfo")?);
    if brand.to_lowercase().starts_with("brand:") {
        return Some(brand["brand:".len()..].trim().to_string());
    }
    if let Some(rest) = brand.strip_prefix("Brand：") {
        return Some(rest.trim().to_string());
    }
    Some(brand)
}

/// Keep the `S$...` part of a price label; anything without `S$` is not a price.
fn clean_price(text: &str) -> Option<String> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with("S$") {
        return Some(cleaned);
    }
    cleaned.find("S$").map(|pos| cleaned[pos..].trim().to_string())
}

/// Current and struck-through prices, read only from the core price block.
fn parse_price(root: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let Some(block) = select_first(root, PRICE_BLOCK) else {
        return (None, None);
    };

    let mut current = select_first(block, ".priceToPay")
        .and_then(|pay| select_first(pay, r#"span[aria-hidden="true"]"#))
        .and_then(|span| {
            let symbol = select_first(span, ".a-price-symbol")?;
            let whole = select_first(span, ".a-price-whole")?;
            let fraction = select_first(span, ".a-price-fraction")
                .map(stripped_text)
                .unwrap_or_default();
            clean_price(&format!("{}{}{}", stripped_text(symbol), stripped_text(whole), fraction))
        });

    if current.is_none() {
        current = select_first(block, ".priceToPay .a-offscreen")
            .map(stripped_text)
            .filter(|t| !t.is_empty())
            .and_then(|t| clean_price(&t));
    }

    if current.is_none() {
        current = select_first(block, ".a-section.a-spacing-none.aok-align-center")
            .and_then(|container| select_first(container, ".aok-offscreen"))
            .map(stripped_text)
            .and_then(|text| {
                let re = OFFSCREEN_PRICE.as_ref()?;
                let caps = re.captures(&text)?;
                Some(format!("S${}", caps.get(1)?.as_str()))
            });
    }

    let list_price_container = block
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| stripped_text(*el).contains("List Price:"));

    let mut original = list_price_container
        .and_then(|container| select_first(container, STRUCK_PRICE))
        .map(stripped_text)
        .filter(|t| !t.is_empty())
        .and_then(|t| clean_price(&t));

    if original.is_none() {
        original = select_first(block, STRUCK_PRICE)
            .map(stripped_text)
            .filter(|t| !t.is_empty())
            .and_then(|t| clean_price(&t));
    }

    (current, original)
}

fn parse_image_urls(root: ElementRef<'_>) -> Vec<String> {
    for script in select_all(root, "script") {
        let content: String = script.text().collect();
        if !content.contains("colorImages") {
            continue;
        }
        let urls = color_images(&content);
        if !urls.is_empty() {
            debug!("Found {} images in colorImages script", urls.len());
            return urls;
        }
    }

    select_all(root, "#imageBlock img")
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect()
}

fn color_images(content: &str) -> Vec<String> {
    let Some(array) = extract_balanced_array(content, COLOR_IMAGES_MARKER) else {
        return Vec::new();
    };

    let images = match parse_relaxed(array) {
        Ok(Value::Array(items)) => items,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("Failed to decode colorImages array: {}", e);
            return Vec::new();
        }
    };

    images
        .iter()
        .filter_map(|img| {
            ["hiRes", "large", "mainUrl"]
                .iter()
                .filter_map(|key| img.get(*key).and_then(Value::as_str))
                .find(|u| !u.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Two-column rows (`th`/`td`) of the table(s) under `scope`.
fn table_pairs(scope: ElementRef<'_>, row_selector: &str) -> Map<String, Value> {
    let mut pairs = Map::new();
    for row in select_all(scope, row_selector) {
        let cells = select_all(row, "th, td");
        if cells.len() < 2 {
            continue;
        }
        let key = text_of(cells[0]);
        let value = text_of(cells[1]);
        if !key.is_empty() && !value.is_empty() {
            pairs.insert(key, Value::String(value));
        }
    }
    pairs
}

fn parse_meta_info(root: ElementRef<'_>) -> Map<String, Value> {
    select_first(root, "#productOverview_feature_div")
        .map(|overview| table_pairs(overview, "table tr"))
        .unwrap_or_default()
}

fn parse_about_this_item(root: ElementRef<'_>) -> Vec<String> {
    let Some(section) = select_first(root, "#feature-bullets") else {
        return Vec::new();
    };
    select_all(section, "li:not(.aok-hidden) span")
        .into_iter()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_product_description(root: ElementRef<'_>) -> Option<String> {
    select_first(root, "#productDescription_feature_div").map(text_of)
}

fn parse_product_information(root: ElementRef<'_>) -> Value {
    let table = |selector: &str| {
        select_first(root, selector)
            .map(|t| table_pairs(t, "tr"))
            .unwrap_or_default()
    };
    json!({
        "technical_details": table("#productDetails_techSpec_section_1"),
        "additional_information": table("#productDetails_detailBullets_sections1"),
    })
}

fn parse_product_details(root: ElementRef<'_>) -> Map<String, Value> {
    let mut details = Map::new();
    let Some(section) = select_first(root, "#detailBullets_feature_div") else {
        return details;
    };
    for li in select_all(section, "li") {
        let text = text_of(li);
        if let Some((key, value)) = text.split_once(':') {
            let key = clean_text(key);
            let value = clean_text(value);
            if !key.is_empty() && !value.is_empty() {
                details.insert(key, Value::String(value));
            }
        }
    }
    details
}

/// Each `h3`/`h4` heading with the text of the siblings up to the next heading.
fn parse_important_information(root: ElementRef<'_>) -> Map<String, Value> {
    let mut sections = Map::new();
    let Some(container) = select_first(root, "div#important-information") else {
        return sections;
    };

    for header in select_all(container, "h3, h4") {
        let title = text_of(header);
        let parts: Vec<String> = next_element_siblings(header)
            .take_while(|sib| !is_tag(*sib, "h3") && !is_tag(*sib, "h4"))
            .map(text_of)
            .filter(|t| !t.is_empty())
            .collect();
        if !parts.is_empty() {
            sections.insert(title, Value::String(parts.join("\n")));
        }
    }
    sections
}
