// Copyright 2024. Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::url::{NormalizedUrl, UrlError};
use itertools::Itertools;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static BASE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("base[href]").unwrap());
static HREF_HOLDER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], area[href]").unwrap());
static META_NO_FOLLOW: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="robots"][content*="nofollow"]"#).unwrap()
});

/// Extracts the distinct http(s) links of [html], resolved against [page] or its `<base>`.
///
/// [page] is the url the document was actually served from, before normalization.
pub fn extract_links(page: &Url, html: &str, respect_nofollow: bool) -> Vec<NormalizedUrl> {
    let html = Html::parse_document(html);
    if respect_nofollow && html.select(&META_NO_FOLLOW).next().is_some() {
        log::debug!("Respecting the no-follow meta tag of {page}");
        return Vec::new();
    }

    let base = html
        .select(&BASE)
        .next()
        .and_then(|base| base.attr("href"))
        .and_then(|href| match page.join(href) {
            Ok(base) => Some(base),
            Err(err) => {
                log::debug!("Was not able to parse the base url of {page}: {err}");
                None
            }
        });
    let base = base.as_ref().unwrap_or(page);

    html.select(&HREF_HOLDER)
        .filter(|element| {
            !respect_nofollow || element.attr("rel").map_or(true, |rel| !rel.contains("nofollow"))
        })
        .filter_map(|element| element.attr("href"))
        .filter_map(|href| match resolve(base, href) {
            Ok(url) => Some(url),
            Err(err) => {
                log::trace!("Dropping the link {href} of {page}: {err}");
                None
            }
        })
        .unique()
        .collect()
}

fn resolve(base: &Url, href: &str) -> Result<NormalizedUrl, UrlError> {
    NormalizedUrl::parse(base.join(href)?.as_str())
}

#[cfg(test)]
mod test {
    use super::extract_links;
    use url::Url;

    fn page() -> Url {
        Url::parse("https://www.test1.de/docs/").unwrap()
    }

    #[test]
    fn resolves_relative_links() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="intro.html#top">Intro</a>
            <a href="https://www.test1.de/docs/intro.html">Intro again</a>
            <a href="https://www.test2.de/">Other</a>
            <a href="mailto:info@test1.de">Mail</a>
            <a href="/about#team">Team</a>
        </body></html>"#;
        let links: Vec<String> = extract_links(&page(), html, true)
            .into_iter()
            .map(|url| url.to_string())
            .collect();
        assert_eq!(
            vec![
                "https://www.test1.de/about",
                "https://www.test1.de/docs/intro.html",
                "https://www.test2.de",
            ],
            links
        );
    }

    #[test]
    fn honours_the_base_element() {
        let html = r#"<html><head><base href="https://cdn.test1.de/root/"></head>
            <body><a href="page">Page</a></body></html>"#;
        let links = extract_links(&page(), html, true);
        assert_eq!("https://cdn.test1.de/root/page", links[0].as_str());
    }

    #[test]
    fn respects_nofollow() {
        let html = r#"<html><body>
            <a href="/kept">Kept</a>
            <a rel="nofollow" href="/skipped">Skipped</a>
        </body></html>"#;
        assert_eq!(1, extract_links(&page(), html, true).len());
        assert_eq!(2, extract_links(&page(), html, false).len());

        let html = r#"<html><head><meta name="robots" content="noindex, nofollow"></head>
            <body><a href="/a">A</a></body></html>"#;
        assert!(extract_links(&page(), html, true).is_empty());
    }
}
