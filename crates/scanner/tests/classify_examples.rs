use archivist_scanner::classify;

#[test]
fn documented_examples() {
    for (input, expected) in [
        ("Show.S02E05.mkv", "s02e05"),
        ("show.s10e01.720p.mkv", "s10e01"),
        ("My Series 7 - Title.mp4", "my_series_e007"),
        ("My Series 1500 - Finale.mp4", "my_series_e1500"),
        ("Anime_Name_24_[1080p].mkv", "anime_name_e024"),
    ] {
        let c = classify(input);
        assert!(!c.is_fallback(), "{input} should classify");
        assert_eq!(c.stem().as_str(), expected, "classifying {input}");
    }
}

#[test]
fn unrecognized_names_fall_back_to_slug() {
    let c = classify("Behind The Scenes.mkv");
    assert!(c.is_fallback());
    assert_eq!(c.stem().as_str(), "behind_the_scenes");
}
