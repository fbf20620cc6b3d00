// URL builder unit tests against the public API

use resin::thumbnail::{sign_source, ThumbnailUrl};

const BASE: &str = "https://thumbs.example.com";
const SOURCE: &str = "https://example.com/image.jpg";

#[test]
fn test_signed_url_carries_source_signature() {
    let url = ThumbnailUrl::new(BASE, SOURCE)
        .dimensions(120, 200)
        .signed("secret")
        .build()
        .unwrap();

    assert_eq!(
        url,
        format!(
            "{}/s/120x200/https%3A%2F%2Fexample.com%2Fimage.jpg?sgn={}",
            BASE,
            sign_source(SOURCE, "secret")
        )
    );
}

#[test]
fn test_signed_srcset_signs_both_densities() {
    let srcset = ThumbnailUrl::new(BASE, SOURCE)
        .dimensions(50, 75)
        .signed("secret")
        .srcset()
        .unwrap();

    let sgn = sign_source(SOURCE, "secret");
    let escaped = "https%3A%2F%2Fexample.com%2Fimage.jpg";
    assert_eq!(
        srcset,
        format!(
            "{base}/s/50x75/{escaped}?sgn={sgn} 1x, {base}/s/100x150/{escaped}?sgn={sgn} 2x",
            base = BASE,
            escaped = escaped,
            sgn = sgn
        )
    );
}

#[test]
fn test_centering_is_appended_after_signature() {
    let url = ThumbnailUrl::new(BASE, SOURCE)
        .dimensions(10, 10)
        .centering(0.25, 0.75)
        .unwrap()
        .signed("secret")
        .build()
        .unwrap();

    assert!(url.ends_with("&c=0.25,0.75"));
}

#[test]
fn test_source_is_trimmed() {
    let url = ThumbnailUrl::new(BASE, "  a.com/x.png \n")
        .dimensions(1, 2)
        .build()
        .unwrap();
    assert_eq!(url, format!("{}/s/1x2/a.com%2Fx.png", BASE));
}
