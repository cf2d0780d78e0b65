//! 分区级联与直播间信息的读取、更新。

use domain::{
    child_choices, parent_choices, parse_tags, validate_inputs, validate_title, InputError, RoomInfo, RoomUpdate,
};
use tracing::{error, info};

use crate::view::{Tone, ViewUpdate};
use crate::PanelController;

impl PanelController {
    /// 启动时加载一次分区列表
    pub async fn load_areas(&self) {
        match self.inner.api.area_list().await {
            Ok(areas) => {
                info!("获取到分区列表，数量: {}", areas.len());
                let parents = parent_choices(&areas);
                let children = {
                    let mut state = self.state();
                    state.areas = areas;
                    child_choices(&state.areas, state.draft.parent_area)
                };
                self.emit(ViewUpdate::ParentAreas(parents));
                self.emit(ViewUpdate::ChildAreas(children));
            }
            Err(e) => error!("加载分区失败: {}", e),
        }
    }

    /// 切换父分区并重建子分区列表，只查内存中的分区表
    pub fn select_parent_area(&self, parent_id: Option<i64>) {
        let children = {
            let mut state = self.state();
            state.draft.parent_area = parent_id;
            state.draft.child_area = None;
            child_choices(&state.areas, parent_id)
        };
        self.emit(ViewUpdate::ChildAreas(children));
        self.emit(ViewUpdate::AreaSelection { parent: parent_id, child: None });
    }

    /// 子分区不在当前列表中时视为未选择
    pub fn select_child_area(&self, child_id: Option<i64>) {
        let (parent, child) = {
            let mut state = self.state();
            let choices = child_choices(&state.areas, state.draft.parent_area);
            state.draft.child_area = child_id.filter(|id| choices.contains(*id));
            (state.draft.parent_area, state.draft.child_area)
        };
        self.emit(ViewUpdate::AreaSelection { parent, child });
    }

    pub async fn get_room_data(&self) -> bool {
        match self.inner.api.room_info().await {
            Ok(info) => {
                self.populate_room_data(info);
                self.show_status("成功获取直播间信息！", Tone::Success);
                true
            }
            Err(e) => {
                error!("获取直播间信息失败: {}", e);
                self.show_status("获取直播间信息失败！", Tone::Error);
                false
            }
        }
    }

    fn populate_room_data(&self, info: RoomInfo) {
        let tags = info.clean_tags();
        let joined = tags.join(", ");
        {
            let mut state = self.state();
            state.draft.title = info.title.clone();
            state.draft.tags_input = joined.clone();
            state.baseline.title = info.title.clone();
            state.baseline.tags = tags;
        }
        self.emit(ViewUpdate::RoomForm { title: info.title, tags: joined });
        // 子分区必须在级联重建之后再选中
        self.select_parent_area(info.area.parent_id);
        self.select_child_area(info.area.id);
    }

    pub async fn update_room_title(&self) -> bool {
        let (room_id, cookies, raw) = {
            let state = self.state();
            (state.session.room_id.clone(), state.session.cookies.clone(), state.draft.title.clone())
        };
        if let Err(e) = validate_inputs(&room_id, &cookies, Some((&raw, "直播间标题"))) {
            return self.reject_input(e);
        }
        let title = match validate_title(&raw) {
            Ok(title) => title,
            Err(e) => return self.reject_input(e),
        };

        let _loading = self.loading();
        match self.inner.api.update_room(&RoomUpdate::title(title.clone())).await {
            Ok(()) => {
                self.show_status("更新直播间标题成功！", Tone::Success);
                self.show_toast("直播间标题已保存", Tone::Success);
                self.state().baseline.title = title;
                true
            }
            Err(e) => {
                error!("更新标题失败: {}", e);
                self.show_toast("直播间标题更新失败", Tone::Error);
                false
            }
        }
    }

    pub async fn update_room_tags(&self) -> bool {
        let (room_id, cookies, raw) = {
            let state = self.state();
            (state.session.room_id.clone(), state.session.cookies.clone(), state.draft.tags_input.clone())
        };
        if let Err(e) = validate_inputs(&room_id, &cookies, Some((&raw, "直播间标签"))) {
            return self.reject_input(e);
        }
        let tags = match parse_tags(&raw) {
            Ok(tags) => tags,
            Err(e) => return self.reject_input(e),
        };

        let _loading = self.loading();
        self.show_status(
            "因为B站对操作有频率限制，所以修改标签需要的时间较久，请耐心等待！",
            Tone::Warning,
        );
        match self.inner.api.update_room(&RoomUpdate::tags(tags.clone())).await {
            Ok(()) => {
                self.show_status("更新直播间标签成功！", Tone::Success);
                self.show_toast("直播间标签已保存", Tone::Success);
                self.state().baseline.tags = tags;
                true
            }
            Err(e) => {
                error!("更新标签失败: {}", e);
                self.show_toast("直播间标签更新失败", Tone::Error);
                self.show_status("更新直播间标签失败！", Tone::Error);
                false
            }
        }
    }

    pub async fn update_room_area(&self) -> bool {
        let (room_id, cookies, parent, child) = {
            let state = self.state();
            (
                state.session.room_id.clone(),
                state.session.cookies.clone(),
                state.draft.parent_area,
                state.draft.child_area,
            )
        };
        let (Some(parent), Some(child)) = (parent, child) else {
            return self.reject_input(InputError::MissingArea);
        };
        if let Err(e) = validate_inputs(&room_id, &cookies, None) {
            return self.reject_input(e);
        }

        let _loading = self.loading();
        match self.inner.api.update_room(&RoomUpdate::area(parent, child)).await {
            Ok(()) => {
                self.show_status("更新直播间分区成功！", Tone::Success);
                self.show_toast("直播间分区已保存", Tone::Success);
                true
            }
            Err(e) => {
                error!("更新分区失败: {}", e);
                self.show_toast("直播间分区更新失败", Tone::Error);
                self.show_status("更新直播间分区失败！", Tone::Error);
                false
            }
        }
    }
}
