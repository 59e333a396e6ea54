use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hcs_core::{
    parse_extension_pattern, ContentSetting, ContentSettingsPattern, ContentSettingsType,
    HostContentSettingsMap, SettingRecord,
};

fn populated_map(count: usize) -> HostContentSettingsMap {
    let map = HostContentSettingsMap::new();
    let records = (0..count).map(|i| SettingRecord {
        pattern: format!("[*.]site{i}.example").parse::<ContentSettingsPattern>().unwrap(),
        content_type: ContentSettingsType::Images,
        setting: ContentSetting::Block,
    });
    map.apply(records);
    map
}

fn bench_lookup(c: &mut Criterion) {
    let map = populated_map(1000);

    c.bench_function("content_setting_hit", |b| {
        b.iter(|| map.content_setting(black_box("www.site500.example"), ContentSettingsType::Images))
    });

    c.bench_function("content_settings_url_miss", |b| {
        b.iter(|| map.content_settings(black_box("https://unknown.org/index.html")))
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_extension_pattern", |b| {
        b.iter(|| parse_extension_pattern(black_box("http://*.example.com:8080/*")))
    });
}

criterion_group!(benches, bench_lookup, bench_parse);
criterion_main!(benches);
