/// Phongシェーディング用の簡易マテリアル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Material {
    /// 拡散色のみ指定して作成
    pub fn with_diffuse(diffuse: [f32; 4]) -> Self {
        Self {
            diffuse,
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.2, 0.2, 0.2, 1.0],
            shininess: 30.0,
        }
    }
}
