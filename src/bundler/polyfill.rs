//! Globals the embedded JS engine lacks, prepended to every server bundle.

/// `TextEncoder` / `TextDecoder` over plain arrays (Yaffle's gist, minified).
pub const TEXT_ENCODING: &str = r#"function TextEncoder(){}function TextDecoder(){}TextEncoder.prototype.encode=function(e){for(var o=[],t=e.length,r=0;r<t;){var n=e.codePointAt(r),c=0,f=0;for(n<=127?(c=0,f=0):n<=2047?(c=6,f=192):n<=65535?(c=12,f=224):n<=2097151&&(c=18,f=240),o.push(f|n>>c),c-=6;c>=0;)o.push(128|n>>c&63),c-=6;r+=n>=65536?2:1}return o},TextDecoder.prototype.decode=function(e){for(var o="",t=0;t<e.length;){var r=e[t],n=0,c=0;if(r<=127?(n=0,c=255&r):r<=223?(n=1,c=31&r):r<=239?(n=2,c=15&r):r<=244&&(n=3,c=7&r),e.length-t-n>0)for(var f=0;f<n;)c=c<<6|63&(r=e[t+f+1]),f+=1;else c=65533,n=e.length-t;o+=String.fromCodePoint(c),t+=n+1}return o};"#;

/// Silent `console`: React logs warnings during render.
pub const CONSOLE: &str = "var console={log:function(){},warn:function(){},error:function(){}};";

/// `--banner:js=` value for server builds.
pub fn banner() -> String {
    let mut banner = String::with_capacity(TEXT_ENCODING.len() + CONSOLE.len());
    banner.push_str(TEXT_ENCODING);
    banner.push_str(CONSOLE);
    banner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_is_single_line() {
        let banner = banner();
        assert!(!banner.contains('\n'));
        assert!(banner.starts_with("function TextEncoder"));
        assert!(banner.ends_with(CONSOLE));
    }

    #[test]
    fn test_banner_evaluates() {
        use boa_engine::{Context, Source};

        let mut ctx = Context::default();
        let script = format!(
            "{}new TextDecoder().decode(new TextEncoder().encode('héllo ✓'))",
            banner()
        );
        let value = ctx.eval(Source::from_bytes(&script)).unwrap();
        let text = value.to_string(&mut ctx).unwrap().to_std_string_escaped();
        assert_eq!(text, "héllo ✓");
    }
}
